mod config;
mod error;
mod framing;
mod memory;
mod protocol;
mod queue;
mod replay;
mod roles;
mod stats;
mod transport;

pub use config::NetConfig;
pub use error::NetError;
pub use framing::{FrameDecoder, decode_frame, encode_frame};
pub use memory::MemoryTransport;
pub use protocol::{
    DEFAULT_PORT, FRAME_DELIMITER, MAX_FRAME_SIZE, Message, PickupRecord, ProtocolError,
    READ_CHUNK_SIZE, Role, ShellRecord, Snapshot, WIRE_PRECISION, WireObject, round_wire,
};
pub use queue::{DEFAULT_QUEUE_CAPACITY, MessageQueue};
pub use replay::ReplayTransport;
pub use roles::{Host, Joiner, advertised_ip, parse_target};
pub use stats::LinkStats;
pub use transport::{Connection, ConnectionState, Transport};
