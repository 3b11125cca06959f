//! Relay metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the relay as a whole
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Payloads accepted by the submission interface
    submitted: AtomicU64,
    /// Messages appended to a queue
    enqueued: AtomicU64,
    /// Messages rejected by a full queue
    dropped: AtomicU64,
    /// Messages handed out by drain calls
    drained: AtomicU64,
}

impl RelayMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn drained(&self) -> u64 {
        self.drained.load(Ordering::Relaxed)
    }

    pub fn add_drained(&self, count: u64) {
        self.drained.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self, sources: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted(),
            enqueued: self.enqueued(),
            dropped: self.dropped(),
            drained: self.drained(),
            sources,
        }
    }
}

/// Snapshot of relay metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub enqueued: u64,
    pub dropped: u64,
    pub drained: u64,
    pub sources: usize,
}

impl MetricsSnapshot {
    /// Payloads the dispatcher has finished with (enqueued or dropped)
    pub fn processed(&self) -> u64 {
        self.enqueued + self.dropped
    }
}
