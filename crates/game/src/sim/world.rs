use glam::Vec2;

use super::arena::{Arena, Rect};
use super::ids::IdGenerator;
use super::pickup::{PickupAuthority, PickupKind};
use super::shell::Shell;
use super::tank::{Buttons, Tank, TankInput};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepEvents {
    pub fired: Option<u32>,
    /// Own shells that came back and struck the local tank.
    pub self_hits: Vec<u32>,
    /// Own shells spent on the opponent. Damage is applied on their side.
    pub opponent_hits: Vec<u32>,
    pub picked: Vec<PickupKind>,
}

/// Everything this peer is authoritative for: its tank, its shells and its
/// side of the pickup arbitration.
#[derive(Debug)]
pub struct LocalWorld {
    pub tank: Tank,
    pub shells: Vec<Shell>,
    pub arena: Arena,
    pub pickups: PickupAuthority,
    ids: IdGenerator,
    tick: u64,
    shell_damage: u32,
}

impl LocalWorld {
    pub fn new(spawn_center: Vec2, arena: Arena, pickups: PickupAuthority, shell_damage: u32) -> Self {
        Self {
            tank: Tank::centered_on(spawn_center),
            shells: Vec::new(),
            arena,
            pickups,
            ids: IdGenerator::new(),
            tick: 0,
            shell_damage,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn active_shells(&self) -> impl Iterator<Item = &Shell> {
        self.shells.iter().filter(|s| s.active)
    }

    /// One tick of local simulation. `blocker` is the opponent's footprint,
    /// which the local tank may not drive into.
    pub fn step(&mut self, input: &TankInput, blocker: Option<&Rect>) -> StepEvents {
        self.tick += 1;
        let mut events = StepEvents::default();

        self.tank.update();
        if let Some(target) = input.aim_at {
            self.tank.aim_at(target);
        }
        self.tank.drive(input.move_direction(), &self.arena, blocker);
        if input.buttons.contains(Buttons::RELOAD) {
            self.tank.reload();
        }
        if input.buttons.contains(Buttons::FIRE) {
            if let Some(shell) = self.tank.fire(&mut self.ids) {
                events.fired = Some(shell.id);
                self.shells.push(shell);
            }
        }

        for shell in &mut self.shells {
            shell.advance(&self.arena);
            shell.resolve_terrain(&self.arena);

            if !shell.active {
                continue;
            }
            if blocker.is_some_and(|opponent| shell.strikes(opponent)) {
                shell.active = false;
                events.opponent_hits.push(shell.id);
            } else if shell.can_hit_firer() && shell.overlaps(&self.tank) {
                shell.active = false;
                self.tank.take_damage(self.shell_damage);
                events.self_hits.push(shell.id);
            }
        }
        self.shells.retain(|s| s.active);

        events.picked = self.pickups.step(self.tick, &mut self.tank, &self.arena);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Role;
    use crate::sim::pickup::PickupConfig;

    fn world() -> LocalWorld {
        LocalWorld::new(
            Vec2::new(640.0, 800.0),
            Arena::default(),
            PickupAuthority::for_role(Role::Joiner, PickupConfig::default(), 0),
            25,
        )
    }

    #[test]
    fn fire_spawns_owned_shell() {
        let mut world = world();
        let input = TankInput {
            buttons: Buttons::FIRE,
            aim_at: Some(Vec2::new(1000.0, 800.0)),
        };

        let events = world.step(&input, None);
        assert_eq!(events.fired, Some(1));
        assert_eq!(world.active_shells().count(), 1);
        assert!(events.self_hits.is_empty());
    }

    #[test]
    fn unbounced_shell_never_hits_firer() {
        let mut world = world();
        let center = world.tank.center();
        world.shells.push(Shell::from_parts(9, center, Vec2::ZERO, 0));

        let events = world.step(&TankInput::idle(), None);
        assert!(events.self_hits.is_empty());
        assert_eq!(world.tank.health, 100);
        assert_eq!(world.shells.len(), 1);
    }

    #[test]
    fn shell_is_spent_on_the_opponent() {
        let mut world = world();
        let opponent = Tank::centered_on(Vec2::new(1200.0, 800.0));
        world.shells.push(Shell::from_parts(99, Vec2::new(1180.0, 800.0), Vec2::new(8.0, 0.0), 0));

        let events = world.step(&TankInput::idle(), Some(&opponent.bounds()));
        assert_eq!(events.opponent_hits, vec![99]);
        assert!(world.shells.is_empty());
        assert_eq!(world.tank.health, 100);

        for _ in 0..20 {
            world.step(&TankInput::idle(), Some(&opponent.bounds()));
        }
        assert!(world.shells.is_empty());
        assert_eq!(world.tank.health, 100);
    }

    #[test]
    fn shell_passes_a_distant_opponent() {
        let mut world = world();
        let opponent = Tank::centered_on(Vec2::new(1200.0, 300.0));
        world.shells.push(Shell::from_parts(5, Vec2::new(1180.0, 800.0), Vec2::new(8.0, 0.0), 0));

        let events = world.step(&TankInput::idle(), Some(&opponent.bounds()));
        assert!(events.opponent_hits.is_empty());
        assert_eq!(world.active_shells().count(), 1);
    }

    #[test]
    fn bounced_shell_hits_firer_once() {
        let mut world = world();
        let center = world.tank.center();
        world.shells.push(Shell::from_parts(9, center, Vec2::ZERO, 1));

        let events = world.step(&TankInput::idle(), None);
        assert_eq!(events.self_hits, vec![9]);
        assert_eq!(world.tank.health, 75);
        assert!(world.shells.is_empty());

        world.step(&TankInput::idle(), None);
        assert_eq!(world.tank.health, 75);
    }
}
