use glam::Vec2;

use crate::net::{ShellRecord, Snapshot, round_wire};
use crate::sim::{LocalWorld, Rect, Shell, Tank};

use super::ghosts::GhostSet;

/// What the opponent last told us about their tank.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTank {
    pub tank: Tank,
}

impl RemoteTank {
    pub fn new(tank: Tank) -> Self {
        Self { tank }
    }

    pub fn footprint(&self) -> Rect {
        self.tank.bounds()
    }
}

pub fn shell_record(shell: &Shell) -> ShellRecord {
    ShellRecord {
        id: shell.id,
        x: round_wire(shell.position.x),
        y: round_wire(shell.position.y),
        vx: round_wire(shell.velocity.x),
        vy: round_wire(shell.velocity.y),
        bounces: shell.bounces,
    }
}

pub fn ghost_shell(record: &ShellRecord) -> Shell {
    Shell::from_parts(
        record.id,
        Vec2::new(record.x, record.y),
        Vec2::new(record.vx, record.vy),
        record.bounces,
    )
}

/// Builds this tick's outbound snapshot. Drains the joiner's pending pickup
/// claims, so calling it twice sends each claim once.
pub fn encode_snapshot(world: &mut LocalWorld) -> Snapshot {
    let tank = &world.tank;
    let mut snapshot = Snapshot {
        x: round_wire(tank.position.x),
        y: round_wire(tank.position.y),
        hull_angle: round_wire(tank.hull_angle),
        turret_angle: round_wire(tank.turret_angle),
        health: tank.health,
        ammo: tank.ammo,
        shells_data: world.active_shells().map(shell_record).collect(),
        powerups_data: world.pickups.records(),
        picked_powerup_ids: Vec::new(),
    };
    snapshot.picked_powerup_ids = world.pickups.drain_claims();
    snapshot
}

/// Folds an inbound snapshot into local state: remote pose and health, a
/// full replacement of the ghost shells, and whichever side of the pickup
/// exchange applies to this peer.
pub fn apply_snapshot(snapshot: &Snapshot, remote: &mut RemoteTank, ghosts: &mut GhostSet, world: &mut LocalWorld) {
    let tank = &mut remote.tank;
    tank.position = Vec2::new(snapshot.x, snapshot.y);
    tank.hull_angle = snapshot.hull_angle;
    tank.turret_angle = snapshot.turret_angle;
    tank.health = snapshot.health;
    tank.ammo = snapshot.ammo;

    ghosts.replace_shells(snapshot.shells_data.iter().map(ghost_shell).collect());

    if let Some(records) = &snapshot.powerups_data {
        world.pickups.apply_remote_pickups(records, world.tick());
    }
    if !snapshot.picked_powerup_ids.is_empty() {
        world.pickups.apply_remote_claims(&snapshot.picked_powerup_ids);
    }
}
