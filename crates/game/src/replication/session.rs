use std::time::{Duration, Instant};

use glam::Vec2;

use crate::net::{Message, Role, Snapshot, Transport};
use crate::sim::{Arena, DEFAULT_TICK_RATE, LocalWorld, PickupAuthority, PickupConfig, StepEvents, Tank, TankInput};

use super::codec::{RemoteTank, apply_snapshot, encode_snapshot};
use super::ghosts::GhostSet;

const MAX_HELD_CONTROLS: usize = 16;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tick_rate: u32,
    pub shell_damage: u32,
    pub connection_lost_after: Duration,
    pub arena: Arena,
    pub pickups: PickupConfig,
    pub pickup_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            shell_damage: 25,
            connection_lost_after: Duration::from_secs(3),
            arena: Arena::default(),
            pickups: PickupConfig::default(),
            pickup_seed: 0x7a4e_d0e1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Won,
    Lost,
}

impl MatchOutcome {
    pub fn for_winner(local: Role, winner: Role) -> Self {
        if local == winner { Self::Won } else { Self::Lost }
    }

    pub fn is_win(self) -> bool {
        self == Self::Won
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: StepEvents,
    pub snapshot_applied: bool,
    /// Snapshots drained this tick that were replaced by a later one.
    pub superseded: usize,
    /// Control messages held back for the endgame.
    pub held_controls: usize,
    pub undecodable: usize,
    pub ghost_hits: Vec<u32>,
    pub sent: bool,
    pub outcome: Option<MatchOutcome>,
}

/// Tank center a role spawns at.
pub fn spawn_point(role: Role, arena: &Arena) -> Vec2 {
    let x = match role {
        Role::Host => arena.width / 4.0,
        Role::Joiner => arena.width * 3.0 / 4.0,
    };
    Vec2::new(x, arena.height / 2.0)
}

/// One match between this peer and the opponent behind `transport`.
///
/// Each call to [`MatchSession::tick`] runs the local step, drains the inbound
/// queue down to the freshest snapshot, applies it, resolves ghost-shell
/// damage, sends this peer's snapshot and checks for the end of the match.
pub struct MatchSession<T: Transport> {
    role: Role,
    transport: T,
    config: SessionConfig,
    world: LocalWorld,
    remote: RemoteTank,
    ghosts: GhostSet,
    started_at: Instant,
    last_snapshot_at: Option<Instant>,
    remote_verdict: Option<Role>,
    held_controls: Vec<Message>,
    outcome: Option<MatchOutcome>,
    ticks: u64,
}

impl<T: Transport> MatchSession<T> {
    pub fn new(role: Role, transport: T, config: SessionConfig) -> Self {
        let world = new_world(role, &config);
        let remote = RemoteTank::new(Tank::centered_on(spawn_point(role.opponent(), &config.arena)));

        Self {
            role,
            transport,
            config,
            world,
            remote,
            ghosts: GhostSet::new(),
            started_at: Instant::now(),
            last_snapshot_at: None,
            remote_verdict: None,
            held_controls: Vec::new(),
            outcome: None,
            ticks: 0,
        }
    }

    /// Fresh match over the same link.
    pub fn reset(&mut self) {
        self.world = new_world(self.role, &self.config);
        self.remote = RemoteTank::new(Tank::centered_on(spawn_point(self.role.opponent(), &self.config.arena)));
        self.ghosts.clear();
        self.started_at = Instant::now();
        self.last_snapshot_at = None;
        self.remote_verdict = None;
        self.held_controls.clear();
        self.outcome = None;
        self.ticks = 0;
        log::info!("Match reset for rematch");
    }

    pub fn tick(&mut self, input: &TankInput) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport {
            events: self.world.step(input, Some(&self.remote.footprint())),
            ..Default::default()
        };

        if let Some(snapshot) = self.drain(&mut report) {
            apply_snapshot(&snapshot, &mut self.remote, &mut self.ghosts, &mut self.world);
            self.last_snapshot_at = Some(Instant::now());
            report.snapshot_applied = true;
        }

        report.ghost_hits = self.ghosts.resolve_hits(&self.world.tank);
        for id in &report.ghost_hits {
            self.world.tank.take_damage(self.config.shell_damage);
            log::debug!("Hit by opponent shell {}", id);
        }

        let snapshot = encode_snapshot(&mut self.world);
        report.sent = match self.transport.send_message(&Message::Snapshot(snapshot)) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Snapshot not sent: {}", e);
                false
            }
        };

        report.outcome = self.check_outcome();
        report
    }

    fn drain(&mut self, report: &mut TickReport) -> Option<Snapshot> {
        let mut latest = None;
        while let Some(received) = self.transport.receive_message() {
            match received {
                Ok(Message::Snapshot(snapshot)) => {
                    if latest.replace(snapshot).is_some() {
                        report.superseded += 1;
                    }
                }
                Ok(Message::MatchOver { winner }) => {
                    if self.remote_verdict.is_none() {
                        self.remote_verdict = Some(winner);
                    }
                }
                Ok(other) => {
                    report.held_controls += 1;
                    log::trace!("Holding {} until the match ends", other.kind());
                    if self.held_controls.len() == MAX_HELD_CONTROLS {
                        self.held_controls.remove(0);
                    }
                    self.held_controls.push(other);
                }
                Err(e) => {
                    report.undecodable += 1;
                    log::debug!("Dropping undecodable message: {}", e);
                }
            }
        }
        latest
    }

    fn check_outcome(&mut self) -> Option<MatchOutcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }

        if let Some(winner) = self.remote_verdict {
            let outcome = MatchOutcome::for_winner(self.role, winner);
            log::info!("Opponent declared the match over: {:?}", outcome);
            self.outcome = Some(outcome);
            return self.outcome;
        }

        if self.world.tank.is_alive() && self.remote.tank.is_alive() {
            return None;
        }

        let winner = if self.world.tank.is_alive() {
            self.role
        } else {
            self.role.opponent()
        };
        let outcome = MatchOutcome::for_winner(self.role, winner);
        log::info!("Match over: {:?}", outcome);

        if let Err(e) = self.transport.send_message(&Message::MatchOver { winner }) {
            log::debug!("Match result not sent: {}", e);
        }
        self.outcome = Some(outcome);
        self.outcome
    }

    /// Score and rematch messages that arrived during play, oldest first.
    /// The opponent may start the endgame exchange in the same tick it
    /// announces the result, so these must reach the endgame sync.
    pub fn take_held_controls(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.held_controls)
    }

    pub fn since_last_snapshot(&self) -> Duration {
        self.last_snapshot_at.unwrap_or(self.started_at).elapsed()
    }

    pub fn is_connection_lost(&self) -> bool {
        self.since_last_snapshot() >= self.config.connection_lost_after
    }

    pub fn has_heard_from_peer(&self) -> bool {
        self.last_snapshot_at.is_some()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn world(&self) -> &LocalWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut LocalWorld {
        &mut self.world
    }

    pub fn remote(&self) -> &Tank {
        &self.remote.tank
    }

    pub fn ghosts(&self) -> &GhostSet {
        &self.ghosts
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

fn new_world(role: Role, config: &SessionConfig) -> LocalWorld {
    LocalWorld::new(
        spawn_point(role, &config.arena),
        config.arena.clone(),
        PickupAuthority::for_role(role, config.pickups.clone(), config.pickup_seed),
        config.shell_damage,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{MemoryTransport, ShellRecord};
    use crate::replication::shell_record;
    use crate::sim::Shell;

    fn pair() -> (MatchSession<MemoryTransport>, MemoryTransport) {
        let (local, remote) = MemoryTransport::pair();
        (
            MatchSession::new(Role::Host, local, SessionConfig::default()),
            remote,
        )
    }

    fn snapshot_at(x: f32, health: u32, shells: Vec<ShellRecord>) -> Snapshot {
        Snapshot {
            x,
            y: 500.0,
            health,
            shells_data: shells,
            ..Default::default()
        }
    }

    #[test]
    fn drain_keeps_only_the_last_snapshot() {
        let (mut session, peer) = pair();
        for i in 0..5 {
            peer.send_message(&Message::Snapshot(snapshot_at(1000.0 + i as f32, 100 - i, Vec::new())))
                .unwrap();
        }
        peer.send_message(&Message::Rematch(true)).unwrap();

        let report = session.tick(&TankInput::idle());
        assert!(report.snapshot_applied);
        assert_eq!(report.superseded, 4);
        assert_eq!(report.held_controls, 1);
        assert_eq!(session.take_held_controls(), vec![Message::Rematch(true)]);
        assert!(session.take_held_controls().is_empty());
        assert_eq!(session.remote().position.x, 1004.0);
        assert_eq!(session.remote().health, 96);
    }

    #[test]
    fn empty_drain_leaves_remote_untouched() {
        let (mut session, _peer) = pair();
        let before = session.remote().clone();
        let report = session.tick(&TankInput::idle());
        assert!(!report.snapshot_applied);
        assert_eq!(session.remote(), &before);
        assert!(!session.has_heard_from_peer());
    }

    #[test]
    fn ghost_shell_damages_once_across_snapshots() {
        let (mut session, peer) = pair();
        let center = session.world().tank.center();
        let record = shell_record(&Shell::from_parts(7, center, Vec2::ZERO, 0));

        for _ in 0..10 {
            peer.send_message(&Message::Snapshot(snapshot_at(2000.0, 100, vec![record.clone()])))
                .unwrap();
            session.tick(&TankInput::idle());
        }
        assert_eq!(session.world().tank.health, 75);
    }

    #[test]
    fn every_tick_sends_a_snapshot() {
        let (mut session, peer) = pair();
        for _ in 0..3 {
            assert!(session.tick(&TankInput::idle()).sent);
        }
        let mut received = 0;
        while let Some(message) = peer.receive_message() {
            assert!(matches!(message.unwrap(), Message::Snapshot(_)));
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[test]
    fn detecting_peer_announces_winner() {
        let (mut session, peer) = pair();
        peer.send_message(&Message::Snapshot(snapshot_at(2000.0, 0, Vec::new()))).unwrap();

        let report = session.tick(&TankInput::idle());
        assert_eq!(report.outcome, Some(MatchOutcome::Won));

        let mut announced = None;
        while let Some(message) = peer.receive_message() {
            if let Message::MatchOver { winner } = message.unwrap() {
                announced = Some(winner);
            }
        }
        assert_eq!(announced, Some(Role::Host));
    }

    #[test]
    fn announced_verdict_is_adopted() {
        let (mut session, peer) = pair();
        peer.send_message(&Message::Snapshot(snapshot_at(2000.0, 100, Vec::new()))).unwrap();
        peer.send_message(&Message::MatchOver { winner: Role::Joiner }).unwrap();

        let report = session.tick(&TankInput::idle());
        assert_eq!(report.outcome, Some(MatchOutcome::Lost));
        assert_eq!(session.world().tank.health, 100);
    }

    #[test]
    fn send_failure_does_not_stop_the_loop() {
        let (mut session, peer) = pair();
        peer.stop();
        let report = session.tick(&TankInput::idle());
        assert!(!report.sent);
        assert!(report.outcome.is_none());
    }

    #[test]
    fn reset_restores_spawn_state() {
        let (mut session, peer) = pair();
        peer.send_message(&Message::Snapshot(snapshot_at(2000.0, 0, Vec::new()))).unwrap();
        session.tick(&TankInput::idle());
        assert!(session.outcome().is_some());

        session.reset();
        assert!(session.outcome().is_none());
        assert_eq!(session.world().tank.health, 100);
        assert_eq!(session.remote().health, 100);
        assert!(session.ghosts().shells().is_empty());
    }
}
