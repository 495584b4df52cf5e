use bitflags::bitflags;
use glam::Vec2;

use super::arena::{Arena, Rect};
use super::ids::IdGenerator;
use super::shell::Shell;

pub const TANK_SIZE: f32 = 40.0;
pub const MAX_HEALTH: u32 = 100;
pub const BASE_SPEED: f32 = 3.0;
pub const MAGAZINE_SIZE: u8 = 3;
pub const FIRE_DELAY_TICKS: u32 = 30;
pub const RELOAD_TICKS: u32 = 120;
pub const MUZZLE_OFFSET: f32 = 25.0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const FIRE = 1 << 4;
        const RELOAD = 1 << 5;
    }
}

/// One tick of player intent, already translated into world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TankInput {
    pub buttons: Buttons,
    pub aim_at: Option<Vec2>,
}

impl TankInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn move_direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.buttons.contains(Buttons::UP) {
            direction.y -= 1.0;
        }
        if self.buttons.contains(Buttons::DOWN) {
            direction.y += 1.0;
        }
        if self.buttons.contains(Buttons::LEFT) {
            direction.x -= 1.0;
        }
        if self.buttons.contains(Buttons::RIGHT) {
            direction.x += 1.0;
        }
        direction
    }
}

/// Angles are in degrees, with 0 pointing up the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    /// Top-left corner.
    pub position: Vec2,
    pub hull_angle: f32,
    pub turret_angle: f32,
    pub health: u32,
    pub speed: f32,
    pub ammo: u8,
    pub fire_cooldown: u32,
    pub reload_cooldown: u32,
    pub reloading: bool,
}

impl Tank {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            hull_angle: 0.0,
            turret_angle: 0.0,
            health: MAX_HEALTH,
            speed: BASE_SPEED,
            ammo: MAGAZINE_SIZE,
            fire_cooldown: 0,
            reload_cooldown: 0,
            reloading: false,
        }
    }

    /// Tank whose top-left corner places its center on `center`.
    pub fn centered_on(center: Vec2) -> Self {
        Self::new(center - Vec2::splat(TANK_SIZE / 2.0))
    }

    pub fn center(&self) -> Vec2 {
        self.position + Vec2::splat(TANK_SIZE / 2.0)
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            min: self.position,
            size: Vec2::splat(TANK_SIZE),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health + amount).min(MAX_HEALTH);
    }

    pub fn aim_at(&mut self, target: Vec2) {
        let delta = target - self.center();
        self.turret_angle = delta.y.atan2(delta.x).to_degrees() + 90.0;
    }

    /// Cooldown and reload progress for one tick.
    pub fn update(&mut self) {
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);

        if self.reloading {
            self.reload_cooldown = self.reload_cooldown.saturating_sub(1);
            if self.reload_cooldown == 0 {
                self.ammo = MAGAZINE_SIZE;
                self.reloading = false;
            }
        }
    }

    /// Moves by `direction * speed`, clamps to the arena and reverts the whole
    /// step if the new footprint overlaps an obstacle or `blocker`.
    pub fn drive(&mut self, direction: Vec2, arena: &Arena, blocker: Option<&Rect>) -> bool {
        if direction == Vec2::ZERO {
            return false;
        }

        let previous = self.position;
        self.position = arena.clamp_tank(self.position + direction * self.speed, TANK_SIZE);
        self.hull_angle = direction.y.atan2(direction.x).to_degrees() + 90.0;

        let bounds = self.bounds();
        if arena.blocks(&bounds) || blocker.is_some_and(|other| other.intersects(&bounds)) {
            self.position = previous;
            return false;
        }
        self.position != previous
    }

    pub fn reload(&mut self) {
        if !self.reloading && self.ammo < MAGAZINE_SIZE {
            self.reloading = true;
            self.reload_cooldown = RELOAD_TICKS;
            self.fire_cooldown = 0;
        }
    }

    pub fn can_fire(&self) -> bool {
        self.fire_cooldown == 0 && self.ammo > 0 && !self.reloading
    }

    pub fn fire(&mut self, ids: &mut IdGenerator) -> Option<Shell> {
        if !self.can_fire() {
            return None;
        }

        let radians = (self.turret_angle - 90.0).to_radians();
        let muzzle = self.center() + Vec2::new(radians.cos(), radians.sin()) * MUZZLE_OFFSET;

        self.ammo -= 1;
        self.fire_cooldown = FIRE_DELAY_TICKS;
        if self.ammo == 0 {
            self.reloading = true;
            self.reload_cooldown = RELOAD_TICKS;
        }

        Some(Shell::fired(ids.allocate(), muzzle, self.turret_angle))
    }
}
