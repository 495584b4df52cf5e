use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;

use super::config::NetConfig;
use super::error::NetError;
use super::framing::{FrameDecoder, encode_frame};
use super::protocol::{Message, ProtocolError, Role, WireObject};
use super::queue::MessageQueue;
use super::stats::{LinkCounters, LinkStats};

/// What the replication loop and the endgame sync need from a link to the
/// other peer. `receive` never blocks.
pub trait Transport {
    fn send(&self, message: &WireObject) -> Result<(), NetError>;

    fn receive(&self) -> Option<WireObject>;

    fn stop(&self);

    fn send_message(&self, message: &Message) -> Result<(), NetError> {
        let wire = message.to_wire()?;
        self.send(&wire)
    }

    fn receive_message(&self) -> Option<Result<Message, ProtocolError>> {
        self.receive().map(Message::from_wire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Waiting,
    Connected,
    Closed,
}

#[derive(Debug)]
struct Shared {
    role: Role,
    running: AtomicBool,
    reader_alive: AtomicBool,
    writer: Mutex<Option<TcpStream>>,
    peer_addr: Mutex<Option<SocketAddr>>,
    queue: MessageQueue,
    counters: LinkCounters,
}

/// One stream link to the remote peer, shared by its role wrapper and its
/// background reader thread.
#[derive(Debug, Clone)]
pub struct Connection {
    shared: Arc<Shared>,
    config: NetConfig,
}

impl Connection {
    pub(crate) fn new(role: Role, config: &NetConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                role,
                running: AtomicBool::new(true),
                reader_alive: AtomicBool::new(false),
                writer: Mutex::new(None),
                peer_addr: Mutex::new(None),
                queue: MessageQueue::new(config.queue_capacity),
                counters: LinkCounters::default(),
            }),
            config: config.clone(),
        }
    }

    /// Configures the socket and installs its write half. The caller then
    /// hands the stream itself to [`Connection::read_until_closed`].
    pub(crate) fn attach(&self, stream: &TcpStream, addr: SocketAddr) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(self.config.read_timeout))?;
        stream.set_write_timeout(Some(self.config.read_timeout))?;
        stream.set_nodelay(true)?;

        let writer = stream.try_clone()?;
        *self.shared.writer.lock() = Some(writer);
        *self.shared.peer_addr.lock() = Some(addr);
        self.shared.reader_alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub(crate) fn spawn_reader(&self, stream: TcpStream) -> io::Result<()> {
        let connection = self.clone();
        thread::Builder::new()
            .name(format!("tankduel-{}-reader", self.shared.role.as_str()))
            .spawn(move || connection.read_until_closed(stream))?;
        Ok(())
    }

    pub(crate) fn read_until_closed(&self, mut stream: TcpStream) {
        let shared = &self.shared;
        let mut decoder = FrameDecoder::new();
        let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];

        while shared.running.load(Ordering::SeqCst) {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    log::info!("Peer closed the connection");
                    break;
                }
                Ok(n) => {
                    shared.counters.record_bytes_received(n);
                    for message in decoder.push(&chunk[..n]) {
                        let evicted = shared.queue.push(message);
                        shared.counters.record_message_received(evicted);
                    }
                    shared.counters.set_frames_dropped(decoder.dropped_frames());
                }
                Err(ref e) if is_timeout(e) => continue,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if shared.running.load(Ordering::SeqCst) {
                        log::warn!("Connection error: {}", e);
                    }
                    break;
                }
            }
        }

        shared.reader_alive.store(false, Ordering::SeqCst);
        if let Some(writer) = shared.writer.lock().take() {
            let _ = writer.shutdown(Shutdown::Both);
        }
        log::debug!("{} reader exited", shared.role.as_str());
    }

    pub fn role(&self) -> Role {
        self.shared.role
    }

    pub fn state(&self) -> ConnectionState {
        if !self.shared.running.load(Ordering::SeqCst) {
            ConnectionState::Closed
        } else if self.shared.reader_alive.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else if self.shared.peer_addr.lock().is_none() {
            ConnectionState::Waiting
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        *self.shared.peer_addr.lock()
    }

    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn stats(&self) -> LinkStats {
        self.shared.counters.snapshot()
    }
}

impl Transport for Connection {
    fn send(&self, message: &WireObject) -> Result<(), NetError> {
        let frame = encode_frame(message)?;

        let mut writer = self.shared.writer.lock();
        let Some(stream) = writer.as_mut() else {
            return Err(if self.is_running() {
                NetError::NotConnected
            } else {
                NetError::Closed
            });
        };

        match stream.write_all(&frame) {
            Ok(()) => {
                self.shared.counters.record_sent(frame.len());
                Ok(())
            }
            Err(e) => {
                self.shared.counters.record_send_failure();
                log::debug!("Send failed, closing link: {}", e);
                if let Some(stream) = writer.take() {
                    let _ = stream.shutdown(Shutdown::Both);
                }
                Err(NetError::Io(e))
            }
        }
    }

    fn receive(&self) -> Option<WireObject> {
        self.shared.queue.pop()
    }

    fn stop(&self) {
        let was_running = self.shared.running.swap(false, Ordering::SeqCst);
        if let Some(stream) = self.shared.writer.lock().take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        if was_running {
            log::info!("{} connection stopped", self.shared.role.as_str());
        }
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
