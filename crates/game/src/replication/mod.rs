mod codec;
mod ghosts;
mod session;

pub use codec::{RemoteTank, apply_snapshot, encode_snapshot, ghost_shell, shell_record};
pub use ghosts::GhostSet;
pub use session::{MatchOutcome, MatchSession, SessionConfig, TickReport, spawn_point};
