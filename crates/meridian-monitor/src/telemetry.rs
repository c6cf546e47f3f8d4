//! Buffered telemetry ingestion
//!
//! External producers push metric readings through a cloneable
//! [`TelemetrySink`]; a background [`TelemetryTask`] drains the buffer on
//! a fast tick and applies the updates through the topology store. Pushing
//! never blocks: a full buffer drops the reading with a warning, and
//! delivery reliability stays the producer's concern.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use meridian_core::{LinkId, LinkMetricsUpdate, NodeId, NodeMetricsUpdate, TopologyError};
use meridian_topology::TopologyStore;

/// One queued metric reading
#[derive(Debug, Clone)]
pub enum TelemetryUpdate {
    Node {
        id: NodeId,
        update: NodeMetricsUpdate,
    },
    Link {
        id: LinkId,
        update: LinkMetricsUpdate,
    },
}

/// Create a telemetry channel with the given buffer capacity
pub fn telemetry_channel(capacity: usize) -> (TelemetrySink, mpsc::Receiver<TelemetryUpdate>) {
    let (tx, rx) = mpsc::channel(capacity);
    (TelemetrySink { tx }, rx)
}

/// Producer handle for the telemetry buffer; cheap to clone
#[derive(Clone)]
pub struct TelemetrySink {
    tx: mpsc::Sender<TelemetryUpdate>,
}

impl TelemetrySink {
    /// Queue a node metric reading; drops it when the buffer is full
    pub fn push_node(&self, id: impl Into<NodeId>, update: NodeMetricsUpdate) {
        let id = id.into();
        if self
            .tx
            .try_send(TelemetryUpdate::Node {
                id: id.clone(),
                update,
            })
            .is_err()
        {
            warn!(node = %id, "telemetry buffer full, dropping node reading");
        }
    }

    /// Queue a link metric reading; drops it when the buffer is full
    pub fn push_link(&self, id: impl Into<LinkId>, update: LinkMetricsUpdate) {
        let id = id.into();
        if self
            .tx
            .try_send(TelemetryUpdate::Link {
                id: id.clone(),
                update,
            })
            .is_err()
        {
            warn!(link = %id, "telemetry buffer full, dropping link reading");
        }
    }
}

/// Background task draining the telemetry buffer into the store
pub struct TelemetryTask {
    store: Arc<TopologyStore>,
    rx: mpsc::Receiver<TelemetryUpdate>,
    sync_interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
    cycle_count: u64,
}

impl TelemetryTask {
    pub fn new(
        store: Arc<TopologyStore>,
        rx: mpsc::Receiver<TelemetryUpdate>,
        sync_interval: Duration,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            store,
            rx,
            sync_interval,
            shutdown_rx,
            cycle_count: 0,
        }
    }

    /// Spawn the task on the current runtime
    pub fn spawn(
        store: Arc<TopologyStore>,
        rx: mpsc::Receiver<TelemetryUpdate>,
        sync_interval: Duration,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let task = Self::new(store, rx, sync_interval, shutdown_rx);
        tokio::spawn(async move {
            task.run().await;
        })
    }

    async fn run(mut self) {
        info!(
            interval_ms = self.sync_interval.as_millis() as u64,
            "telemetry task started"
        );

        let mut interval = tokio::time::interval(self.sync_interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("telemetry task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.cycle_count += 1;
                    let applied = self.drain();
                    if applied > 0 {
                        debug!(cycle = self.cycle_count, applied, "telemetry drained");
                    }
                }
            }
        }
    }

    /// Apply every buffered reading; returns how many were applied
    ///
    /// Readings for ids that were removed in the meantime are dropped, as
    /// a stale producer is not an error.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.rx.try_recv() {
            let result = match update {
                TelemetryUpdate::Node { id, update } => self
                    .store
                    .update_node_metrics(&id, update)
                    .map_err(|e| (e, format!("{}", id))),
                TelemetryUpdate::Link { id, update } => self
                    .store
                    .update_link_metrics(&id, update)
                    .map_err(|e| (e, format!("{}", id))),
            };
            match result {
                Ok(()) => applied += 1,
                Err((
                    TopologyError::NodeNotFound(_) | TopologyError::LinkNotFound(_),
                    id,
                )) => {
                    debug!(id = %id, "telemetry for removed element dropped");
                }
                Err((e, id)) => {
                    warn!(id = %id, error = %e, "telemetry update rejected");
                }
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use meridian_core::{LinkKind, LinkSpec, NodeKind, NodeSpec, Position};

    use super::*;

    fn seeded_store() -> Arc<TopologyStore> {
        let store = TopologyStore::new();
        for id in ["a", "b"] {
            store
                .add_node(NodeSpec::new(id, NodeKind::Relay, Position::local(0.0, 0.0, 0.0)))
                .unwrap();
        }
        store
            .add_link(LinkSpec::new("a", "b", LinkKind::Wifi).with_id("ab"))
            .unwrap();
        Arc::new(store)
    }

    fn task_pair(store: Arc<TopologyStore>, capacity: usize) -> (TelemetrySink, TelemetryTask) {
        let (sink, rx) = telemetry_channel(capacity);
        let (shutdown_tx, _) = broadcast::channel(1);
        let task = TelemetryTask::new(store, rx, Duration::from_millis(5), shutdown_tx.subscribe());
        (sink, task)
    }

    #[test]
    fn test_drain_applies_node_and_link_readings() {
        let store = seeded_store();
        let (sink, mut task) = task_pair(Arc::clone(&store), 16);

        sink.push_node("a", NodeMetricsUpdate::new().with_latency_ms(42.0));
        sink.push_link("ab", LinkMetricsUpdate::new().with_latency_ms(7.0));

        assert_eq!(task.drain(), 2);
        assert_eq!(store.node(&NodeId::from("a")).unwrap().metrics.latency_ms, 42.0);
        assert_eq!(store.link(&LinkId::from("ab")).unwrap().latency_ms, 7.0);
        // buffer is now empty
        assert_eq!(task.drain(), 0);
    }

    #[test]
    fn test_readings_for_removed_elements_are_dropped() {
        let store = seeded_store();
        let (sink, mut task) = task_pair(Arc::clone(&store), 16);

        sink.push_node("ghost", NodeMetricsUpdate::new().with_latency_ms(1.0));
        sink.push_link("severed", LinkMetricsUpdate::new().with_packets(5));
        sink.push_node("a", NodeMetricsUpdate::new().with_uptime_pct(90.0));

        // unknown ids do not count as applied and do not stop the drain
        assert_eq!(task.drain(), 1);
        assert_eq!(store.node(&NodeId::from("a")).unwrap().metrics.uptime_pct, 90.0);
    }

    #[test]
    fn test_full_buffer_drops_without_blocking() {
        let store = seeded_store();
        let (sink, mut task) = task_pair(Arc::clone(&store), 2);

        for i in 0..10 {
            sink.push_node("a", NodeMetricsUpdate::new().with_latency_ms(i as f64));
        }

        // only the readings that fit survive
        assert_eq!(task.drain(), 2);
        assert_eq!(store.node(&NodeId::from("a")).unwrap().metrics.latency_ms, 1.0);
    }

    #[tokio::test]
    async fn test_task_drains_on_tick_and_stops_on_shutdown() {
        let store = seeded_store();
        let (sink, rx) = telemetry_channel(16);
        let (shutdown_tx, _) = broadcast::channel(1);

        let handle = TelemetryTask::spawn(
            Arc::clone(&store),
            rx,
            Duration::from_millis(5),
            shutdown_tx.subscribe(),
        );

        sink.push_node("a", NodeMetricsUpdate::new().with_latency_ms(33.0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.node(&NodeId::from("a")).unwrap().metrics.latency_ms, 33.0);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
