use glam::Vec2;

use super::arena::{Arena, ObstacleKind, Rect, Side};
use super::tank::Tank;

pub const SHELL_RADIUS: f32 = 4.0;
pub const SHELL_SPEED: f32 = 8.0;
pub const MAX_BOUNCES: u8 = 3;

/// A projectile. Locally owned shells are simulated; ghost shells are rebuilt
/// from the opponent's snapshot every time one arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub bounces: u8,
    pub active: bool,
}

impl Shell {
    pub fn fired(id: u32, origin: Vec2, angle_degrees: f32) -> Self {
        let radians = (angle_degrees - 90.0).to_radians();
        Self {
            id,
            position: origin,
            velocity: Vec2::new(radians.cos(), radians.sin()) * SHELL_SPEED,
            bounces: 0,
            active: true,
        }
    }

    pub fn from_parts(id: u32, position: Vec2, velocity: Vec2, bounces: u8) -> Self {
        Self {
            id,
            position,
            velocity,
            bounces,
            active: true,
        }
    }

    /// Moves one tick and reflects off the arena edges. Runs out of bounces
    /// means the shell is spent.
    pub fn advance(&mut self, arena: &Arena) {
        if !self.active {
            return;
        }

        self.position += self.velocity;
        let mut bounced = false;

        if self.position.x - SHELL_RADIUS <= 0.0 || self.position.x + SHELL_RADIUS >= arena.width {
            if !self.try_bounce() {
                return;
            }
            self.velocity.x = -self.velocity.x;
            self.position.x = self.position.x.clamp(SHELL_RADIUS, arena.width - SHELL_RADIUS);
            bounced = true;
        }

        if self.position.y - SHELL_RADIUS <= 0.0 || self.position.y + SHELL_RADIUS >= arena.height {
            if !self.try_bounce() {
                return;
            }
            self.velocity.y = -self.velocity.y;
            self.position.y = self.position.y.clamp(SHELL_RADIUS, arena.height - SHELL_RADIUS);
            bounced = true;
        }

        if bounced {
            self.bounces += 1;
        }
    }

    fn try_bounce(&mut self) -> bool {
        if self.bounces < MAX_BOUNCES {
            true
        } else {
            self.active = false;
            false
        }
    }

    /// Water swallows the shell; rock reflects it and pushes it clear of the
    /// face it struck.
    pub fn resolve_terrain(&mut self, arena: &Arena) {
        if !self.active {
            return;
        }
        let Some(contact) = arena.shell_contact(self.position, SHELL_RADIUS) else {
            return;
        };

        if contact.obstacle.kind == ObstacleKind::Water || !self.try_bounce() {
            self.active = false;
            return;
        }

        if contact.side.is_horizontal_hit() {
            self.velocity.x = -self.velocity.x;
        } else {
            self.velocity.y = -self.velocity.y;
        }
        self.bounces += 1;

        let rect = contact.obstacle.rect;
        let clearance = SHELL_RADIUS + 1.0;
        match contact.side {
            Side::Left => self.position.x = rect.min.x - clearance,
            Side::Right => self.position.x = rect.max().x + clearance,
            Side::Top => self.position.y = rect.min.y - clearance,
            Side::Bottom => self.position.y = rect.max().y + clearance,
        }
    }

    pub fn overlaps(&self, tank: &Tank) -> bool {
        self.strikes(&tank.bounds())
    }

    /// Circle test against the bounding circle of a square tank footprint.
    pub fn strikes(&self, footprint: &Rect) -> bool {
        let radius = footprint.size.x.min(footprint.size.y) / 2.0;
        self.position.distance(footprint.center()) < radius + SHELL_RADIUS
    }

    /// A freshly fired shell starts inside its firer's reach; it only becomes
    /// dangerous to them after its first bounce.
    pub fn can_hit_firer(&self) -> bool {
        self.bounces > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fired_velocity_follows_angle() {
        let up = Shell::fired(1, Vec2::ZERO, 0.0);
        assert!((up.velocity - Vec2::new(0.0, -SHELL_SPEED)).length() < 1e-4);

        let right = Shell::fired(2, Vec2::ZERO, 90.0);
        assert!((right.velocity - Vec2::new(SHELL_SPEED, 0.0)).length() < 1e-4);
    }

    #[test]
    fn edge_bounces_then_expires() {
        let arena = Arena::open(100.0, 100.0);
        let mut shell = Shell::from_parts(1, Vec2::new(90.0, 50.0), Vec2::new(8.0, 0.0), 0);

        shell.advance(&arena);
        assert_eq!(shell.bounces, 1);
        assert!(shell.velocity.x < 0.0);
        assert!(shell.position.x <= 100.0 - SHELL_RADIUS);

        let mut spent = Shell::from_parts(2, Vec2::new(90.0, 50.0), Vec2::new(8.0, 0.0), MAX_BOUNCES);
        spent.advance(&arena);
        assert!(!spent.active);
    }

    #[test]
    fn rock_reflects_and_water_destroys() {
        let rock = Arena::default().with_obstacle(Rect::new(100.0, 0.0, 50.0, 400.0), ObstacleKind::Rock);
        let mut shell = Shell::from_parts(1, Vec2::new(98.0, 200.0), Vec2::new(8.0, 0.0), 0);
        shell.resolve_terrain(&rock);
        assert!(shell.active);
        assert_eq!(shell.bounces, 1);
        assert!(shell.velocity.x < 0.0);
        assert_eq!(shell.position.x, 100.0 - SHELL_RADIUS - 1.0);

        let water = Arena::default().with_obstacle(Rect::new(100.0, 0.0, 50.0, 400.0), ObstacleKind::Water);
        let mut shell = Shell::from_parts(2, Vec2::new(98.0, 200.0), Vec2::new(8.0, 0.0), 0);
        shell.resolve_terrain(&water);
        assert!(!shell.active);
    }

    #[test]
    fn tank_overlap_uses_bounding_circle() {
        let tank = Tank::centered_on(Vec2::new(100.0, 100.0));
        assert!(Shell::from_parts(1, Vec2::new(120.0, 100.0), Vec2::ZERO, 0).overlaps(&tank));
        assert!(!Shell::from_parts(2, Vec2::new(125.0, 100.0), Vec2::ZERO, 0).overlaps(&tank));
    }
}
