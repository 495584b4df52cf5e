use std::thread;
use std::time::{Duration, Instant};

use crate::net::{Message, NetError, Transport};

use super::scores::{Leaderboard, LeaderboardEntry, ScoreError, ScoreStore};

#[derive(Debug, Clone)]
pub struct EndgameConfig {
    pub sync_timeout: Duration,
    pub merged_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for EndgameConfig {
    fn default() -> Self {
        Self {
            sync_timeout: Duration::from_secs(5),
            merged_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub leaderboard: Leaderboard,
    pub received_remote: bool,
    pub received_merged: bool,
    /// The opponent asked for a rematch while scores were being exchanged.
    pub rematch_requested: bool,
}

/// Exchanges leaderboards with the opponent and converges on their
/// field-wise max. Either wait timing out just skips that step; whatever
/// was merged so far is saved.
pub fn reconcile_scores<T, S>(transport: &T, store: &S, config: &EndgameConfig) -> Result<SyncReport, ScoreError>
where
    T: Transport + ?Sized,
    S: ScoreStore + ?Sized,
{
    let mut report = SyncReport {
        leaderboard: store.load(),
        ..Default::default()
    };

    send_or_log(
        transport,
        &Message::ScoresSync(report.leaderboard.entries().to_vec()),
    );

    let remote = wait_for(transport, config.sync_timeout, config.poll_interval, &mut report, |message| match message {
        Message::ScoresSync(entries) => Some(entries),
        _ => None,
    });
    let Some(remote) = remote else {
        log::warn!("No leaderboard from opponent within {:?}", config.sync_timeout);
        return Ok(report);
    };
    report.received_remote = true;

    report.leaderboard.merge(&remote);
    store.save(&report.leaderboard)?;
    send_or_log(
        transport,
        &Message::ScoresMerged(report.leaderboard.entries().to_vec()),
    );

    let merged = wait_for(transport, config.merged_timeout, config.poll_interval, &mut report, |message| match message {
        Message::ScoresMerged(entries) => Some(entries),
        _ => None,
    });
    match merged {
        Some(entries) => {
            report.received_merged = true;
            report.leaderboard.merge(&entries);
            store.save(&report.leaderboard)?;
        }
        None => log::warn!("No merged leaderboard from opponent within {:?}", config.merged_timeout),
    }

    Ok(report)
}

/// Records the local result first, then reconciles with the opponent.
pub fn finish_match<T, S>(
    transport: &T,
    store: &S,
    player: &str,
    won: bool,
    config: &EndgameConfig,
) -> Result<SyncReport, ScoreError>
where
    T: Transport + ?Sized,
    S: ScoreStore + ?Sized,
{
    let mut board = store.load();
    board.record(player, won);
    store.save(&board)?;
    log::info!("Recorded {} for {}", if won { "win" } else { "loss" }, player);

    reconcile_scores(transport, store, config)
}

pub fn request_rematch<T: Transport + ?Sized>(transport: &T) -> Result<(), NetError> {
    transport.send_message(&Message::Rematch(true))
}

/// Polls until the opponent asks for a rematch or `timeout` passes. Anything
/// else received meanwhile is discarded.
pub fn wait_for_rematch<T: Transport + ?Sized>(transport: &T, timeout: Duration, poll_interval: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        while let Some(received) = transport.receive_message() {
            if let Ok(Message::Rematch(true)) = received {
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(poll_interval);
    }
}

fn wait_for<T, F>(
    transport: &T,
    timeout: Duration,
    poll_interval: Duration,
    report: &mut SyncReport,
    mut select: F,
) -> Option<Vec<LeaderboardEntry>>
where
    T: Transport + ?Sized,
    F: FnMut(Message) -> Option<Vec<LeaderboardEntry>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        while let Some(received) = transport.receive_message() {
            let message = match received {
                Ok(message) => message,
                Err(e) => {
                    log::debug!("Dropping undecodable message: {}", e);
                    continue;
                }
            };
            if message == Message::Rematch(true) {
                report.rematch_requested = true;
                continue;
            }
            let kind = message.kind();
            match select(message) {
                Some(entries) => return Some(entries),
                None => log::trace!("Discarding {} while waiting for scores", kind),
            }
        }

        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(poll_interval);
    }
}

fn send_or_log<T: Transport + ?Sized>(transport: &T, message: &Message) {
    if let Err(e) = transport.send_message(message) {
        log::debug!("Could not send {}: {}", message.kind(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endgame::MemoryStore;
    use crate::net::{MemoryTransport, ReplayTransport, Role};
    use crate::replication::{MatchOutcome, MatchSession, SessionConfig};
    use crate::sim::TankInput;

    fn quick() -> EndgameConfig {
        EndgameConfig {
            sync_timeout: Duration::from_millis(50),
            merged_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn entry(name: &str, wins: u32, losses: u32, games: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            wins,
            losses,
            games,
        }
    }

    #[test]
    fn timeout_keeps_local_result() {
        let (local, _remote) = MemoryTransport::pair();
        let store = MemoryStore::new();

        let report = finish_match(&local, &store, "Ana", true, &quick()).unwrap();
        assert!(!report.received_remote);
        assert_eq!(store.load().get("ana").map(|e| e.wins), Some(1));
    }

    #[test]
    fn merges_remote_board_and_remembers_rematch() {
        let (local, remote) = MemoryTransport::pair();
        let store = MemoryStore::with_board(Leaderboard::from_entries(vec![entry("Ana", 2, 0, 2)]));

        remote.send_message(&Message::Snapshot(Default::default())).unwrap();
        remote.send_message(&Message::Rematch(true)).unwrap();
        remote
            .send_message(&Message::ScoresSync(vec![entry("ana", 1, 3, 4), entry("Bo", 5, 0, 5)]))
            .unwrap();
        remote
            .send_message(&Message::ScoresMerged(vec![entry("Bo", 6, 0, 6)]))
            .unwrap();

        let report = reconcile_scores(&local, &store, &quick()).unwrap();
        assert!(report.received_remote);
        assert!(report.received_merged);
        assert!(report.rematch_requested);

        let saved = store.load();
        assert_eq!(saved.get("ana"), Some(&entry("Ana", 2, 3, 4)));
        assert_eq!(saved.entries()[0], entry("Bo", 6, 0, 6));

        let mut sent = Vec::new();
        while let Some(message) = remote.receive_message() {
            sent.push(message.unwrap().kind());
        }
        assert_eq!(sent, vec!["scores_sync", "scores_merged"]);
    }

    #[test]
    fn rematch_signal() {
        let (local, remote) = MemoryTransport::pair();
        assert!(!wait_for_rematch(&local, Duration::from_millis(5), Duration::from_millis(1)));

        request_rematch(&remote).unwrap();
        assert!(wait_for_rematch(&local, Duration::from_millis(5), Duration::from_millis(1)));
    }

    #[test]
    fn scores_sent_with_the_verdict_reach_the_endgame() {
        let (host_link, joiner_link) = MemoryTransport::pair();
        let mut host = MatchSession::new(Role::Host, host_link, SessionConfig::default());
        let mut joiner = MatchSession::new(Role::Joiner, joiner_link, SessionConfig::default());
        let config = EndgameConfig {
            sync_timeout: Duration::from_secs(2),
            merged_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(1),
        };

        joiner.world_mut().tank.health = 0;
        assert_eq!(joiner.tick(&TankInput::idle()).outcome, Some(MatchOutcome::Lost));

        let joiner_config = config.clone();
        let remote = thread::spawn(move || {
            let store = MemoryStore::new();
            let report = finish_match(joiner.transport(), &store, "Bo", false, &joiner_config).unwrap();
            (report, store.load())
        });

        let deadline = Instant::now() + Duration::from_secs(2);
        while host.transport().pending() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        let report = host.tick(&TankInput::idle());
        assert_eq!(report.outcome, Some(MatchOutcome::Won));
        assert_eq!(report.held_controls, 1);

        let held = host.take_held_controls();
        let link = ReplayTransport::new(host.transport(), held);
        let store = MemoryStore::new();
        let host_report = finish_match(&link, &store, "Ana", true, &config).unwrap();
        let (joiner_report, joiner_board) = remote.join().unwrap();

        assert!(host_report.received_remote);
        assert!(host_report.received_merged);
        assert!(joiner_report.received_remote);
        assert!(joiner_report.received_merged);

        let host_board = store.load();
        assert_eq!(host_board, joiner_board);
        assert_eq!(host_board.get("ana"), Some(&entry("Ana", 1, 0, 1)));
        assert_eq!(host_board.get("bo"), Some(&entry("Bo", 0, 1, 1)));
    }
}
