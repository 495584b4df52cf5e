use std::collections::VecDeque;

use parking_lot::Mutex;

use super::error::NetError;
use super::protocol::{Message, ProtocolError, WireObject};
use super::transport::Transport;

/// Wraps a live link and hands out `backlog` before anything still queued on
/// it. Sends and stop go straight through.
#[derive(Debug)]
pub struct ReplayTransport<'a, T: Transport + ?Sized> {
    inner: &'a T,
    backlog: Mutex<VecDeque<Message>>,
}

impl<'a, T: Transport + ?Sized> ReplayTransport<'a, T> {
    pub fn new(inner: &'a T, backlog: Vec<Message>) -> Self {
        Self {
            inner,
            backlog: Mutex::new(backlog.into()),
        }
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.lock().len()
    }
}

impl<T: Transport + ?Sized> Transport for ReplayTransport<'_, T> {
    fn send(&self, message: &WireObject) -> Result<(), NetError> {
        self.inner.send(message)
    }

    fn receive(&self) -> Option<WireObject> {
        while let Some(message) = self.backlog.lock().pop_front() {
            match message.to_wire() {
                Ok(wire) => return Some(wire),
                Err(e) => log::debug!("Dropping held {}: {}", message.kind(), e),
            }
        }
        self.inner.receive()
    }

    fn stop(&self) {
        self.inner.stop();
    }

    fn receive_message(&self) -> Option<Result<Message, ProtocolError>> {
        if let Some(message) = self.backlog.lock().pop_front() {
            return Some(Ok(message));
        }
        self.inner.receive_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::MemoryTransport;

    #[test]
    fn backlog_comes_first() {
        let (local, remote) = MemoryTransport::pair();
        remote.send_message(&Message::Rematch(false)).unwrap();

        let link = ReplayTransport::new(&local, vec![Message::Rematch(true)]);
        assert_eq!(link.backlog_len(), 1);
        assert_eq!(link.receive_message().unwrap().unwrap(), Message::Rematch(true));
        assert_eq!(link.receive_message().unwrap().unwrap(), Message::Rematch(false));
        assert!(link.receive_message().is_none());
    }

    #[test]
    fn raw_receive_also_drains_backlog() {
        let (local, remote) = MemoryTransport::pair();
        let link = ReplayTransport::new(&local, vec![Message::Rematch(true)]);

        let wire = link.receive().unwrap();
        assert_eq!(Message::from_wire(wire).unwrap(), Message::Rematch(true));
        assert!(link.receive().is_none());

        link.send_message(&Message::Rematch(true)).unwrap();
        assert_eq!(remote.receive_message().unwrap().unwrap(), Message::Rematch(true));
    }
}
