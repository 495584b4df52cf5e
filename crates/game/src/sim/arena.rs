use glam::Vec2;

pub const ARENA_WIDTH: f32 = 2560.0;
pub const ARENA_HEIGHT: f32 = 1600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn centered(center: Vec2, size: f32) -> Self {
        Self {
            min: center - Vec2::splat(size / 2.0),
            size: Vec2::splat(size),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount / 2.0),
            size: self.size + Vec2::splat(amount),
        }
    }

    /// Strict overlap; touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    /// Blocks tanks, bounces shells.
    Rock,
    /// Blocks tanks, destroys shells.
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub rect: Rect,
    pub kind: ObstacleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal_hit(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub obstacle: Obstacle,
    pub side: Side,
}

/// Playfield bounds plus whatever obstacles the map layer placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub obstacles: Vec<Obstacle>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::open(ARENA_WIDTH, ARENA_HEIGHT)
    }
}

impl Arena {
    pub fn open(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            obstacles: Vec::new(),
        }
    }

    pub fn with_obstacle(mut self, rect: Rect, kind: ObstacleKind) -> Self {
        self.obstacles.push(Obstacle { rect, kind });
        self
    }

    pub fn clamp_tank(&self, position: Vec2, size: f32) -> Vec2 {
        Vec2::new(
            position.x.clamp(0.0, (self.width - size).max(0.0)),
            position.y.clamp(0.0, (self.height - size).max(0.0)),
        )
    }

    pub fn blocks(&self, rect: &Rect) -> bool {
        self.obstacles.iter().any(|o| o.rect.intersects(rect))
    }

    /// First obstacle the shell's bounding box overlaps, with the side of
    /// that obstacle closest to the shell center. Water is checked first.
    pub fn shell_contact(&self, center: Vec2, radius: f32) -> Option<Contact> {
        let bounds = Rect::centered(center, radius * 2.0);
        let hit = |kind: ObstacleKind| {
            self.obstacles
                .iter()
                .find(|o| o.kind == kind && o.rect.intersects(&bounds))
        };

        hit(ObstacleKind::Water)
            .or_else(|| hit(ObstacleKind::Rock))
            .map(|obstacle| Contact {
                obstacle: *obstacle,
                side: closest_side(center, &obstacle.rect),
            })
    }
}

fn closest_side(point: Vec2, rect: &Rect) -> Side {
    let max = rect.max();
    let candidates = [
        (Side::Left, (point.x - rect.min.x).abs()),
        (Side::Right, (point.x - max.x).abs()),
        (Side::Top, (point.y - rect.min.y).abs()),
        (Side::Bottom, (point.y - max.y).abs()),
    ];

    candidates
        .into_iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(side, _)| side)
        .unwrap_or(Side::Left)
}
