use std::time::Duration;

use super::protocol::{DEFAULT_PORT, READ_CHUNK_SIZE};
use super::queue::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone)]
pub struct NetConfig {
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub queue_capacity: usize,
    pub read_chunk_size: usize,
    pub accept_poll_interval: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_chunk_size: READ_CHUNK_SIZE,
            accept_poll_interval: Duration::from_millis(10),
        }
    }
}

impl NetConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }
}
