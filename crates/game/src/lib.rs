pub mod endgame;
pub mod net;
pub mod replication;
pub mod sim;

pub use endgame::{
    EndgameConfig, JsonFileStore, Leaderboard, LeaderboardEntry, MemoryStore, ScoreError,
    ScoreStore, SyncReport, finish_match, reconcile_scores, request_rematch, wait_for_rematch,
};
pub use net::{
    Connection, ConnectionState, DEFAULT_PORT, FrameDecoder, Host, Joiner, LinkStats,
    MemoryTransport, Message, MessageQueue, NetConfig, NetError, PickupRecord, ProtocolError,
    ReplayTransport, Role, ShellRecord, Snapshot, Transport, WireObject, advertised_ip,
    parse_target,
};
pub use replication::{GhostSet, MatchOutcome, MatchSession, SessionConfig, TickReport};
pub use sim::{
    Arena, Buttons, DEFAULT_TICK_RATE, FixedTimestep, IdGenerator, LocalWorld, PickupAuthority,
    PickupConfig, PickupKind, Shell, Tank, TankInput,
};
