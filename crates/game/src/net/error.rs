use std::io;
use std::net::SocketAddr;

use super::protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("could not listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("could not connect to {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("no peer connected")]
    NotConnected,
    #[error("connection closed")]
    Closed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl NetError {
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectFailed { .. })
    }
}
