use std::collections::VecDeque;

use parking_lot::Mutex;

use super::protocol::WireObject;

pub const DEFAULT_QUEUE_CAPACITY: usize = 120;

/// Bounded FIFO of decoded messages shared between the reader thread and the
/// game loop. The lock is held for a single push or pop only.
#[derive(Debug)]
pub struct MessageQueue {
    inner: Mutex<VecDeque<WireObject>>,
    capacity: usize,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl MessageQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns true when the oldest message had to be evicted.
    pub fn push(&self, message: WireObject) -> bool {
        let mut queue = self.inner.lock();
        let evicted = if queue.len() >= self.capacity {
            queue.pop_front();
            true
        } else {
            false
        };
        queue.push_back(message);
        evicted
    }

    pub fn pop(&self) -> Option<WireObject> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
