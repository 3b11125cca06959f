//! Dispatcher - the single writer of the queue table

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{ContractError, Payload};

use crate::handle::RelayHandle;
use crate::metrics::RelayMetrics;
use crate::queue::QueueFull;
use crate::table::QueueTable;

/// What happened to one dispatched payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Appended; `depth` is the queue length afterwards
    Enqueued { depth: usize },
    /// Queue was full; the payload was discarded
    Dropped { capacity: usize },
}

/// Serializes every queue creation and append.
///
/// Payloads are processed one at a time in arrival order, which is what makes
/// per-source FIFO well defined under concurrent submission.
pub struct Dispatcher {
    table: Arc<QueueTable>,
    input_rx: mpsc::UnboundedReceiver<Payload>,
    metrics: Arc<RelayMetrics>,
}

impl Dispatcher {
    pub(crate) fn new(
        table: Arc<QueueTable>,
        input_rx: mpsc::UnboundedReceiver<Payload>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            table,
            input_rx,
            metrics,
        }
    }

    /// Run the dispatcher main loop
    ///
    /// Returns when every submission handle has been dropped. A full queue
    /// never ends the loop.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) {
        info!(capacity = self.table.capacity(), "Dispatcher started");

        let mut payload_count: u64 = 0;

        while let Some(payload) = self.input_rx.recv().await {
            payload_count += 1;
            self.dispatch(payload);

            if payload_count.is_multiple_of(1000) {
                debug!(
                    payloads = payload_count,
                    sources = self.table.source_count(),
                    "Dispatcher progress"
                );
            }
        }

        info!(
            payloads = payload_count,
            "Dispatcher input closed, shutting down"
        );
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Apply one payload to the queue table.
    pub fn dispatch(&self, payload: Payload) -> DispatchOutcome {
        let queue = self.table.get_or_create(&payload.source);

        match queue.push(payload.into_message()) {
            Ok(depth) => {
                self.metrics.inc_enqueued();
                observability::record_message_enqueued(depth);
                debug!(source = %queue.source(), depth, "Message enqueued");
                DispatchOutcome::Enqueued { depth }
            }
            Err(QueueFull { capacity, rejected }) => {
                self.metrics.inc_dropped();
                observability::record_message_dropped();
                warn!(
                    source = %queue.source(),
                    capacity,
                    bytes = rejected.len(),
                    "Queue full, dropping incoming message"
                );
                DispatchOutcome::Dropped { capacity }
            }
        }
    }
}

/// Build a relay: the submission/drain handle plus its dispatcher.
///
/// The dispatcher must be spawned (or run) for submitted payloads to reach
/// the queues.
///
/// # Errors
/// `capacity` is zero.
#[instrument(name = "relay_create")]
pub fn create_relay(capacity: usize) -> Result<(RelayHandle, Dispatcher), ContractError> {
    let table = Arc::new(QueueTable::new(capacity)?);
    let metrics = Arc::new(RelayMetrics::new());
    let (input_tx, input_rx) = mpsc::unbounded_channel();

    let handle = RelayHandle::new(input_tx, Arc::clone(&table), Arc::clone(&metrics));
    let dispatcher = Dispatcher::new(table, input_rx, metrics);

    Ok((handle, dispatcher))
}
