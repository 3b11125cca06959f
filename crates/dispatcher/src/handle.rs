//! RelayHandle - submission and drain entry points

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error};

use contracts::{ContractError, Message, Payload, SourceId};

use crate::metrics::{MetricsSnapshot, RelayMetrics};
use crate::table::QueueTable;

/// Cloneable handle used by ingestion and polling collaborators.
///
/// Submissions go through the dispatcher; drains read the queue table
/// directly and run concurrently with it.
#[derive(Clone)]
pub struct RelayHandle {
    /// Channel into the dispatcher
    tx: mpsc::UnboundedSender<Payload>,
    /// Shared queue table
    table: Arc<QueueTable>,
    /// Shared metrics
    metrics: Arc<RelayMetrics>,
}

impl RelayHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Payload>,
        table: Arc<QueueTable>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self { tx, table, metrics }
    }

    /// Hand a payload to the dispatcher (non-blocking, fire-and-forget).
    ///
    /// Success means the payload was accepted for processing, not that it was
    /// enqueued: whether it lands or is dropped is decided later by the
    /// dispatcher.
    ///
    /// # Errors
    /// The dispatcher is no longer running.
    pub fn submit(
        &self,
        source: impl Into<SourceId>,
        body: impl Into<Bytes>,
    ) -> Result<(), ContractError> {
        let payload = Payload::new(source, body);
        debug!(source = %payload.source, bytes = payload.body.len(), "Payload submitted");

        match self.tx.send(payload) {
            Ok(()) => {
                self.metrics.inc_submitted();
                observability::record_payload_submitted();
                Ok(())
            }
            Err(mpsc::error::SendError(payload)) => {
                error!(source = %payload.source, "Dispatcher closed, payload rejected");
                Err(ContractError::dispatcher_closed(payload.source.as_str()))
            }
        }
    }

    /// Remove and return all buffered messages for `source`, oldest first.
    ///
    /// Unknown sources and empty queues yield an empty vec. A message is
    /// returned by at most one drain call.
    pub fn drain(&self, source: &str) -> Vec<Message> {
        let Some(queue) = self.table.lookup(source) else {
            debug!(source, "Drain for unknown source");
            return Vec::new();
        };

        let messages = queue.drain();
        if !messages.is_empty() {
            self.metrics.add_drained(messages.len() as u64);
            observability::record_messages_drained(messages.len());
            debug!(source, count = messages.len(), "Queue drained");
        }
        messages
    }

    /// Per-queue capacity
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Number of sources seen so far
    pub fn source_count(&self) -> usize {
        self.table.source_count()
    }

    /// Current buffered message count for `source` (0 if unknown)
    pub fn depth(&self, source: &str) -> usize {
        self.table.lookup(source).map_or(0, |q| q.len())
    }

    /// Get current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.table.source_count())
    }

    /// True once the dispatcher has stopped receiving
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_relay;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    /// Wait until the dispatcher has processed `expected` payloads
    async fn settle(handle: &RelayHandle, expected: u64) {
        timeout(Duration::from_secs(5), async {
            while handle.metrics().processed() < expected {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("dispatcher did not settle");
    }

    #[tokio::test]
    async fn test_submit_then_drain_in_order() {
        let (handle, dispatcher) = create_relay(16).unwrap();
        dispatcher.spawn();

        for body in ["m1", "m2", "m3"] {
            handle.submit("agent1", body).unwrap();
        }
        settle(&handle, 3).await;

        assert_eq!(
            handle.drain("agent1"),
            vec![Message::from("m1"), Message::from("m2"), Message::from("m3")]
        );
    }

    #[tokio::test]
    async fn test_overflow_keeps_first_c() {
        let (handle, dispatcher) = create_relay(3).unwrap();
        dispatcher.spawn();

        for i in 0..10 {
            handle.submit("agent1", format!("m{i}")).unwrap();
        }
        settle(&handle, 10).await;

        let drained: Vec<String> = handle
            .drain("agent1")
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(drained, vec!["m0", "m1", "m2"]);
        assert!(handle.drain("agent1").is_empty());
        assert_eq!(handle.metrics().dropped, 7);
    }

    #[tokio::test]
    async fn test_unknown_source_drains_empty() {
        let (handle, dispatcher) = create_relay(4).unwrap();
        dispatcher.spawn();

        assert!(handle.drain("nobody").is_empty());
        assert_eq!(handle.source_count(), 0);
    }

    #[tokio::test]
    async fn test_sources_are_isolated() {
        let (handle, dispatcher) = create_relay(4).unwrap();
        dispatcher.spawn();

        handle.submit("s1", "for-s1").unwrap();
        handle.submit("s2", "for-s2").unwrap();
        settle(&handle, 2).await;

        assert_eq!(handle.drain("s2"), vec![Message::from("for-s2")]);
        assert_eq!(handle.drain("s1"), vec![Message::from("for-s1")]);
    }

    #[tokio::test]
    async fn test_dispatcher_survives_overflow() {
        let (handle, dispatcher) = create_relay(1).unwrap();
        let task = dispatcher.spawn();

        handle.submit("a", "1").unwrap();
        handle.submit("a", "2").unwrap();
        settle(&handle, 2).await;
        assert_eq!(handle.metrics().dropped, 1);
        assert!(!task.is_finished());

        handle.submit("b", "3").unwrap();
        handle.submit("a", "4").unwrap();
        settle(&handle, 4).await;

        assert_eq!(handle.drain("b"), vec![Message::from("3")]);
        // "4" was dropped too: "1" still occupies the only slot
        assert_eq!(handle.drain("a"), vec![Message::from("1")]);

        handle.submit("a", "5").unwrap();
        settle(&handle, 5).await;
        assert_eq!(handle.drain("a"), vec![Message::from("5")]);
    }

    #[tokio::test]
    async fn test_concurrent_submitters_keep_per_source_order() {
        const PER_SOURCE: usize = 200;
        let (handle, dispatcher) = create_relay(PER_SOURCE).unwrap();
        dispatcher.spawn();

        let producers: Vec<_> = (0..8)
            .map(|p| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    for i in 0..PER_SOURCE {
                        handle.submit(format!("src{p}"), format!("{i}")).unwrap();
                        if i % 16 == 0 {
                            tokio::task::yield_now().await;
                        }
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }
        settle(&handle, 8 * PER_SOURCE as u64).await;

        for p in 0..8 {
            let got: Vec<usize> = handle
                .drain(&format!("src{p}"))
                .iter()
                .map(|m| m.as_str().parse().unwrap())
                .collect();
            assert_eq!(got, (0..PER_SOURCE).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_submit_after_dispatcher_gone() {
        let (handle, dispatcher) = create_relay(4).unwrap();
        drop(dispatcher);

        assert!(handle.is_closed());
        let err = handle.submit("agent1", "late").unwrap_err();
        assert!(matches!(err, ContractError::DispatcherClosed { .. }));
    }
}
