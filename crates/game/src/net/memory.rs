use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::error::NetError;
use super::framing::{FrameDecoder, encode_frame};
use super::protocol::WireObject;
use super::queue::{DEFAULT_QUEUE_CAPACITY, MessageQueue};
use super::transport::Transport;

#[derive(Debug)]
struct Mailbox {
    queue: MessageQueue,
    decoder: Mutex<FrameDecoder>,
}

impl Mailbox {
    fn new(capacity: usize) -> Self {
        Self {
            queue: MessageQueue::new(capacity),
            decoder: Mutex::new(FrameDecoder::new()),
        }
    }

    fn deliver(&self, bytes: &[u8]) {
        for message in self.decoder.lock().push(bytes) {
            self.queue.push(message);
        }
    }
}

/// In-process link with the same framing and queue behaviour as a socket
/// connection. Frames are delivered on `send`, with no reader thread.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    inbox: Arc<Mailbox>,
    outbox: Arc<Mailbox>,
    closed: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let a = Arc::new(Mailbox::new(capacity));
        let b = Arc::new(Mailbox::new(capacity));
        let closed = Arc::new(AtomicBool::new(false));

        (
            Self {
                inbox: Arc::clone(&a),
                outbox: Arc::clone(&b),
                closed: Arc::clone(&closed),
            },
            Self {
                inbox: b,
                outbox: a,
                closed,
            },
        )
    }

    /// Feeds raw bytes to this end as if the peer had written them.
    pub fn inject_bytes(&self, bytes: &[u8]) {
        self.inbox.deliver(bytes);
    }

    pub fn pending(&self) -> usize {
        self.inbox.queue.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: &WireObject) -> Result<(), NetError> {
        if self.is_closed() {
            return Err(NetError::Closed);
        }
        let frame = encode_frame(message)?;
        self.outbox.deliver(&frame);
        Ok(())
    }

    fn receive(&self) -> Option<WireObject> {
        self.inbox.queue.pop()
    }

    fn stop(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Message;

    #[test]
    fn pair_delivers_in_order() {
        let (a, b) = MemoryTransport::pair();
        a.send_message(&Message::Rematch(true)).unwrap();
        a.send_message(&Message::Rematch(false)).unwrap();

        assert_eq!(b.receive_message().unwrap().unwrap(), Message::Rematch(true));
        assert_eq!(b.receive_message().unwrap().unwrap(), Message::Rematch(false));
        assert!(b.receive_message().is_none());
        assert!(a.receive().is_none());
    }

    #[test]
    fn stop_closes_both_ends() {
        let (a, b) = MemoryTransport::pair();
        b.stop();
        assert!(matches!(a.send_message(&Message::Rematch(true)), Err(NetError::Closed)));
        assert!(b.receive().is_none());
    }

    #[test]
    fn injected_garbage_is_dropped() {
        let (a, _b) = MemoryTransport::pair();
        a.inject_bytes(b"{\"rematch\": true}\n{nope\n{\"rematch\": false}\n");
        assert_eq!(a.pending(), 2);
    }
}
