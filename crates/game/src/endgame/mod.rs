mod scores;
mod sync;

pub use scores::{JsonFileStore, Leaderboard, LeaderboardEntry, MemoryStore, ScoreError, ScoreStore};
pub use sync::{EndgameConfig, SyncReport, finish_match, reconcile_scores, request_rematch, wait_for_rematch};
