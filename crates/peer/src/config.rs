use std::path::PathBuf;
use std::time::Duration;

use tankduel::{EndgameConfig, NetConfig, SessionConfig};

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub player_name: String,
    pub scores_path: PathBuf,
    pub net: NetConfig,
    pub session: SessionConfig,
    pub endgame: EndgameConfig,
    pub peer_wait: Duration,
    pub rematch_wait: Duration,
    pub rematches: u32,
    pub max_ticks: Option<u64>,
    pub seed: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            scores_path: PathBuf::from("scores.json"),
            net: NetConfig::default(),
            session: SessionConfig::default(),
            endgame: EndgameConfig::default(),
            peer_wait: Duration::from_secs(60),
            rematch_wait: Duration::from_secs(5),
            rematches: 0,
            max_ticks: None,
            seed: 0,
        }
    }
}
