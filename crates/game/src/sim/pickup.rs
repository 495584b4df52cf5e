use std::collections::HashSet;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::net::{PickupRecord, Role, round_wire};

use super::arena::{Arena, Rect};
use super::ids::IdGenerator;
use super::tank::{BASE_SPEED, Tank};
use super::timestep::{DEFAULT_TICK_RATE, seconds_to_ticks};

pub const PICKUP_SIZE: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupKind {
    Heal,
    Speed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub center: Vec2,
    pub spawned_tick: u64,
}

impl Pickup {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.center, PICKUP_SIZE)
    }

    pub fn record(&self) -> PickupRecord {
        PickupRecord {
            id: self.id,
            x: round_wire(self.center.x),
            y: round_wire(self.center.y),
            kind: self.kind,
        }
    }

    fn from_record(record: &PickupRecord, tick: u64) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            center: Vec2::new(record.x, record.y),
            spawned_tick: tick,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PickupConfig {
    pub spawn_interval_ticks: u64,
    pub lifetime_ticks: u64,
    pub max_active: usize,
    pub boost_ticks: u64,
    pub heal_amount: u32,
    pub speed_multiplier: f32,
    pub spawn_attempts: u32,
    pub spawn_margin: f32,
    pub spacing: f32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ticks: seconds_to_ticks(5.0, DEFAULT_TICK_RATE),
            lifetime_ticks: seconds_to_ticks(12.0, DEFAULT_TICK_RATE),
            max_active: 3,
            boost_ticks: seconds_to_ticks(6.0, DEFAULT_TICK_RATE),
            heal_amount: 25,
            speed_multiplier: 1.6,
            spawn_attempts: 40,
            spawn_margin: 40.0,
            spacing: 14.0,
        }
    }
}

#[derive(Debug)]
pub enum PickupStrategy {
    /// Host side. Owns spawning, expiry and removal.
    Authoritative {
        pickups: Vec<Pickup>,
        ids: IdGenerator,
        rng: StdRng,
        last_spawn_tick: u64,
    },
    /// Joiner side. Mirrors the host's list and tracks provisional claims.
    Replica {
        pickups: Vec<Pickup>,
        pending: Vec<u32>,
        claimed: HashSet<u32>,
    },
}

/// Pickup state for one peer, with the host acting as the single arbiter of
/// which pickups exist.
#[derive(Debug)]
pub struct PickupAuthority {
    strategy: PickupStrategy,
    config: PickupConfig,
    boost_until: u64,
}

impl PickupAuthority {
    pub fn for_role(role: Role, config: PickupConfig, seed: u64) -> Self {
        let strategy = match role {
            Role::Host => PickupStrategy::Authoritative {
                pickups: Vec::new(),
                ids: IdGenerator::new(),
                rng: StdRng::seed_from_u64(seed),
                last_spawn_tick: 0,
            },
            Role::Joiner => PickupStrategy::Replica {
                pickups: Vec::new(),
                pending: Vec::new(),
                claimed: HashSet::new(),
            },
        };

        Self {
            strategy,
            config,
            boost_until: 0,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self.strategy, PickupStrategy::Authoritative { .. })
    }

    pub fn config(&self) -> &PickupConfig {
        &self.config
    }

    pub fn visible(&self) -> &[Pickup] {
        match &self.strategy {
            PickupStrategy::Authoritative { pickups, .. } | PickupStrategy::Replica { pickups, .. } => pickups,
        }
    }

    pub fn boost_remaining(&self, tick: u64) -> u64 {
        self.boost_until.saturating_sub(tick)
    }

    /// Runs spawn and expiry (host only), then collection for the local tank.
    /// Returns the kinds picked up this tick.
    pub fn step(&mut self, tick: u64, tank: &mut Tank, arena: &Arena) -> Vec<PickupKind> {
        if let PickupStrategy::Authoritative {
            pickups,
            ids,
            rng,
            last_spawn_tick,
        } = &mut self.strategy
        {
            let config = &self.config;
            if pickups.len() < config.max_active && tick.saturating_sub(*last_spawn_tick) >= config.spawn_interval_ticks {
                if let Some(pickup) = spawn_candidate(config, arena, pickups, rng, ids, tick) {
                    log::debug!("Spawned {:?} pickup {}", pickup.kind, pickup.id);
                    pickups.push(pickup);
                    *last_spawn_tick = tick;
                }
            }
            pickups.retain(|p| tick.saturating_sub(p.spawned_tick) < config.lifetime_ticks);
        }

        let footprint = tank.bounds();
        let (pickups, mut claims) = match &mut self.strategy {
            PickupStrategy::Authoritative { pickups, .. } => (pickups, None),
            PickupStrategy::Replica {
                pickups,
                pending,
                claimed,
            } => (pickups, Some((pending, claimed))),
        };

        let mut collected = Vec::new();
        pickups.retain(|pickup| {
            if !footprint.intersects(&pickup.bounds()) {
                return true;
            }
            if let Some((pending, claimed)) = claims.as_mut() {
                pending.push(pickup.id);
                claimed.insert(pickup.id);
            }
            collected.push(pickup.kind);
            false
        });

        for kind in &collected {
            self.apply_effect(*kind, tick, tank);
        }
        self.refresh_speed(tick, tank);
        collected
    }

    fn apply_effect(&mut self, kind: PickupKind, tick: u64, tank: &mut Tank) {
        match kind {
            PickupKind::Heal => tank.heal(self.config.heal_amount),
            PickupKind::Speed => self.boost_until = tick + self.config.boost_ticks,
        }
    }

    fn refresh_speed(&self, tick: u64, tank: &mut Tank) {
        tank.speed = if tick < self.boost_until {
            BASE_SPEED * self.config.speed_multiplier
        } else {
            BASE_SPEED
        };
    }

    /// Host: places a pickup at a fixed spot, outside the spawn timer.
    pub fn place(&mut self, kind: PickupKind, center: Vec2, tick: u64) -> Option<u32> {
        let PickupStrategy::Authoritative { pickups, ids, .. } = &mut self.strategy else {
            return None;
        };
        let id = ids.allocate();
        pickups.push(Pickup {
            id,
            kind,
            center,
            spawned_tick: tick,
        });
        Some(id)
    }

    /// The host's broadcast list. Always `Some` on the host, even when empty.
    pub fn records(&self) -> Option<Vec<PickupRecord>> {
        match &self.strategy {
            PickupStrategy::Authoritative { pickups, .. } => Some(pickups.iter().map(Pickup::record).collect()),
            PickupStrategy::Replica { .. } => None,
        }
    }

    /// Claims made since the last call. Empty on the host.
    pub fn drain_claims(&mut self) -> Vec<u32> {
        match &mut self.strategy {
            PickupStrategy::Authoritative { .. } => Vec::new(),
            PickupStrategy::Replica { pending, .. } => std::mem::take(pending),
        }
    }

    /// Host: removes pickups the joiner reports having collected.
    pub fn apply_remote_claims(&mut self, claimed_ids: &[u32]) -> usize {
        let PickupStrategy::Authoritative { pickups, .. } = &mut self.strategy else {
            return 0;
        };
        let before = pickups.len();
        pickups.retain(|p| !claimed_ids.contains(&p.id));
        let removed = before - pickups.len();
        if removed > 0 {
            log::debug!("Removed {} pickup(s) claimed by the joiner", removed);
        }
        removed
    }

    /// Joiner: adopts the host's list. Pickups we already claimed stay hidden,
    /// and a claim the host still lists is sent again since the snapshot that
    /// carried it may have been superseded before the host read it.
    pub fn apply_remote_pickups(&mut self, records: &[PickupRecord], tick: u64) {
        let PickupStrategy::Replica {
            pickups,
            pending,
            claimed,
        } = &mut self.strategy
        else {
            return;
        };

        claimed.retain(|id| records.iter().any(|r| r.id == *id));
        for id in claimed.iter() {
            if !pending.contains(id) {
                pending.push(*id);
            }
        }

        *pickups = records
            .iter()
            .filter(|r| !claimed.contains(&r.id))
            .map(|r| Pickup::from_record(r, tick))
            .collect();
    }
}

fn spawn_candidate(
    config: &PickupConfig,
    arena: &Arena,
    existing: &[Pickup],
    rng: &mut StdRng,
    ids: &mut IdGenerator,
    tick: u64,
) -> Option<Pickup> {
    let kind = if rng.gen_bool(0.5) {
        PickupKind::Heal
    } else {
        PickupKind::Speed
    };
    let margin = config.spawn_margin;
    if arena.width <= margin * 2.0 || arena.height <= margin * 2.0 {
        return None;
    }

    for _ in 0..config.spawn_attempts {
        let center = Vec2::new(
            rng.gen_range(margin..arena.width - margin).round(),
            rng.gen_range(margin..arena.height - margin).round(),
        );
        let bounds = Rect::centered(center, PICKUP_SIZE);

        let blocked = arena.blocks(&bounds);
        let crowded = existing
            .iter()
            .any(|other| bounds.intersects(&other.bounds().inflate(config.spacing)));
        if !blocked && !crowded {
            return Some(Pickup {
                id: ids.allocate(),
                kind,
                center,
                spawned_tick: tick,
            });
        }
    }
    None
}
