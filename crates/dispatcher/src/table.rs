//! QueueTable - source id -> queue mapping

use std::sync::Arc;

use dashmap::DashMap;

use contracts::{ContractError, SourceId};

use crate::queue::SourceQueue;

/// Process-wide mapping from source to its bounded queue.
///
/// Queues are created lazily by the dispatcher and never removed. Lookups
/// clone the queue's `Arc` out of the map, so the shard lock is released
/// before any push or pop and work on different sources never contends.
#[derive(Debug)]
pub struct QueueTable {
    queues: DashMap<SourceId, Arc<SourceQueue>>,
    capacity: usize,
}

impl QueueTable {
    /// Create an empty table whose queues hold `capacity` messages each.
    ///
    /// # Errors
    /// `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ContractError> {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                "queue.capacity",
                "capacity must be > 0",
            ));
        }

        Ok(Self {
            queues: DashMap::new(),
            capacity,
        })
    }

    /// Per-queue capacity shared by every source
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of sources seen so far
    pub fn source_count(&self) -> usize {
        self.queues.len()
    }

    /// Return the queue for `source`, installing an empty one if absent.
    ///
    /// Only the dispatcher calls this.
    pub(crate) fn get_or_create(&self, source: &SourceId) -> Arc<SourceQueue> {
        if let Some(existing) = self.queues.get(source.as_str()) {
            return Arc::clone(&*existing);
        }

        let queue = {
            let entry = self
                .queues
                .entry(source.clone())
                .or_insert_with(|| Arc::new(SourceQueue::new(source.clone(), self.capacity)));
            Arc::clone(&*entry)
        };

        // Shard guard must be released before len() walks the shards.
        observability::record_source_count(self.queues.len());
        queue
    }

    /// Read-only lookup, never creates.
    pub fn lookup(&self, source: &str) -> Option<Arc<SourceQueue>> {
        self.queues.get(source).map(|q| Arc::clone(&*q))
    }
}
