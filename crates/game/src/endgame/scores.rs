use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("could not access leaderboard file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode leaderboard: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub games: u32,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wins: 0,
            losses: 0,
            games: 0,
        }
    }

    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    fn absorb(&mut self, other: &LeaderboardEntry) {
        self.wins = self.wins.max(other.wins);
        self.losses = self.losses.max(other.losses);
        self.games = self.games.max(other.games);
    }
}

/// Win/loss records keyed case-insensitively by player name, kept sorted by
/// wins, most first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Self {
        let mut board = Self::new();
        board.merge(&entries);
        board
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&LeaderboardEntry> {
        let key = name.to_lowercase();
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn record(&mut self, name: &str, won: bool) -> &LeaderboardEntry {
        let key = name.to_lowercase();
        let index = match self.entries.iter().position(|e| e.key() == key) {
            Some(index) => index,
            None => {
                self.entries.push(LeaderboardEntry::new(name));
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        entry.games += 1;
        if won {
            entry.wins += 1;
        } else {
            entry.losses += 1;
        }

        let key = entry.key();
        self.sort();
        let index = self.entries.iter().position(|e| e.key() == key).unwrap_or(0);
        &self.entries[index]
    }

    /// Field-wise max per player. Players only known remotely are added with
    /// the name spelling they arrived with.
    pub fn merge(&mut self, remote: &[LeaderboardEntry]) {
        let mut index: HashMap<String, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key(), i))
            .collect();

        for entry in remote {
            let key = entry.key();
            match index.get(&key) {
                Some(&i) => self.entries[i].absorb(entry),
                None => {
                    index.insert(key, self.entries.len());
                    self.entries.push(entry.clone());
                }
            }
        }
        self.sort();
    }

    pub fn merged(&self, remote: &[LeaderboardEntry]) -> Self {
        let mut board = self.clone();
        board.merge(remote);
        board
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.key().cmp(&b.key())));
    }
}

/// Where a peer keeps its leaderboard between matches.
pub trait ScoreStore {
    fn load(&self) -> Leaderboard;

    fn save(&self, board: &Leaderboard) -> Result<(), ScoreError>;
}

/// Pretty-printed JSON array on disk. A missing or unreadable file loads as
/// an empty board.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clear(&self) -> Result<(), ScoreError> {
        self.save(&Leaderboard::new())
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> Leaderboard {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Leaderboard::new(),
            Err(e) => {
                log::warn!("Could not read {}: {}", self.path.display(), e);
                return Leaderboard::new();
            }
        };

        match serde_json::from_str::<Vec<LeaderboardEntry>>(&text) {
            Ok(entries) => Leaderboard::from_entries(entries),
            Err(e) => {
                log::warn!("Ignoring malformed leaderboard {}: {}", self.path.display(), e);
                Leaderboard::new()
            }
        }
    }

    fn save(&self, board: &Leaderboard) -> Result<(), ScoreError> {
        let text = serde_json::to_string_pretty(board)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ScoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| ScoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    board: Mutex<Leaderboard>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(board: Leaderboard) -> Self {
        Self {
            board: Mutex::new(board),
        }
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Leaderboard {
        self.board.lock().clone()
    }

    fn save(&self, board: &Leaderboard) -> Result<(), ScoreError> {
        *self.board.lock() = board.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn entry(name: &str, wins: u32, losses: u32, games: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            wins,
            losses,
            games,
        }
    }

    #[test]
    fn record_is_case_insensitive_and_sorted() {
        let mut board = Leaderboard::new();
        board.record("Ana", true);
        board.record("bob", true);
        board.record("BOB", true);
        let ana = board.record("ana", false).clone();

        assert_eq!(ana, entry("Ana", 1, 1, 2));
        assert_eq!(board.len(), 2);
        assert_eq!(board.entries()[0], entry("bob", 2, 0, 2));
    }

    #[test]
    fn merge_takes_field_wise_max() {
        let mut board = Leaderboard::from_entries(vec![entry("Ana", 3, 1, 4)]);
        board.merge(&[entry("ANA", 2, 5, 7), entry("Cid", 1, 0, 1)]);

        assert_eq!(board.get("ana"), Some(&entry("Ana", 3, 5, 7)));
        assert_eq!(board.get("cid"), Some(&entry("Cid", 1, 0, 1)));
    }

    #[test]
    fn merge_is_idempotent_and_commutative() {
        let a = Leaderboard::from_entries(vec![entry("Ana", 3, 1, 4), entry("Bob", 0, 2, 2)]);
        let b = Leaderboard::from_entries(vec![entry("ana", 1, 4, 5), entry("Cid", 2, 2, 4)]);

        let ab = a.merged(b.entries());
        assert_eq!(ab.merged(b.entries()), ab);

        let ba = b.merged(a.entries());
        assert_eq!(ab.len(), ba.len());
        for left in ab.entries() {
            let right = ba.get(&left.name).unwrap();
            assert_eq!((left.wins, left.losses, left.games), (right.wins, right.losses, right.games));
        }
    }

    #[test]
    fn json_store_roundtrip_and_missing_file() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("tankduel-scores-{}-{}.json", std::process::id(), nanos));
        let store = JsonFileStore::new(&path);

        assert!(store.load().is_empty());

        let mut board = store.load();
        board.record("Ana", true);
        store.save(&board).unwrap();
        assert_eq!(store.load(), board);

        fs::write(&path, "not json").unwrap();
        assert!(store.load().is_empty());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn wire_shape() {
        let board = Leaderboard::from_entries(vec![entry("Ana", 1, 0, 1)]);
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"name": "Ana", "wins": 1, "losses": 0, "games": 1}])
        );
    }
}
