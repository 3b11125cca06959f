//! SourceQueue - bounded per-source mailbox

use crossbeam_queue::ArrayQueue;

use contracts::{Message, SourceId};

/// A push into a full queue; carries the rejected message back.
#[derive(Debug)]
pub struct QueueFull {
    pub capacity: usize,
    pub rejected: Message,
}

/// Bounded FIFO of messages for one source.
///
/// Backed by a lock-free array queue: the dispatcher pushes while any number
/// of drain calls pop concurrently, and every pop hands a message to exactly
/// one caller.
#[derive(Debug)]
pub struct SourceQueue {
    source: SourceId,
    slots: ArrayQueue<Message>,
}

impl SourceQueue {
    /// Create an empty queue. `capacity` must be > 0.
    pub(crate) fn new(source: SourceId, capacity: usize) -> Self {
        Self {
            source,
            slots: ArrayQueue::new(capacity),
        }
    }

    /// Source this queue belongs to
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Maximum number of buffered messages
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Current number of buffered messages
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a message at the tail.
    ///
    /// Returns the queue depth after the append. A full queue rejects the
    /// incoming message and keeps what it already holds.
    pub fn push(&self, message: Message) -> Result<usize, QueueFull> {
        self.slots.push(message).map_err(|rejected| QueueFull {
            capacity: self.capacity(),
            rejected,
        })?;
        Ok(self.slots.len())
    }

    /// Remove and return every message present when the call started, oldest first.
    ///
    /// Messages appended while draining are left for the next call. Racing
    /// drains split the pending messages between them without overlap.
    pub fn drain(&self) -> Vec<Message> {
        let pending = self.slots.len();
        let mut drained = Vec::with_capacity(pending);

        while drained.len() < pending {
            match self.slots.pop() {
                Some(message) => drained.push(message),
                None => break,
            }
        }

        drained
    }
}
