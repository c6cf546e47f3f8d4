//! Periodic health monitoring and adaptive reoptimization

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use meridian_geo::RouteOptimizer;
use meridian_topology::TopologyStore;

use crate::health::{health_score, needs_reoptimization, status_for_score};

/// Background task that re-scores every node on a fixed interval
///
/// Each cycle computes the health score from the latest ingested metrics,
/// transitions node status through the store (which bumps `last_seen` for
/// every node and emits `node_updated` on actual changes), and rebuilds
/// the continental route table when any node crosses a reoptimization
/// threshold or the optimizer was marked dirty by a topology change.
pub struct HealthMonitor {
    store: Arc<TopologyStore>,
    optimizer: Arc<RouteOptimizer>,
    check_interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
    cycle_count: u64,
}

impl HealthMonitor {
    pub fn new(
        store: Arc<TopologyStore>,
        optimizer: Arc<RouteOptimizer>,
        check_interval: Duration,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            store,
            optimizer,
            check_interval,
            shutdown_rx,
            cycle_count: 0,
        }
    }

    /// Spawn the monitor on the current runtime
    pub fn spawn(
        store: Arc<TopologyStore>,
        optimizer: Arc<RouteOptimizer>,
        check_interval: Duration,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let task = Self::new(store, optimizer, check_interval, shutdown_rx);
        tokio::spawn(async move {
            task.run().await;
        })
    }

    async fn run(mut self) {
        info!(
            interval_secs = self.check_interval.as_secs(),
            "health monitor started"
        );

        let mut interval = tokio::time::interval(self.check_interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("health monitor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.cycle_count += 1;
                    self.run_cycle();
                }
            }
        }
    }

    /// One monitoring pass; public so tests can drive cycles directly
    pub fn run_cycle(&mut self) {
        let nodes = self.store.nodes();
        let mut transitions = 0;
        let mut trigger = false;

        for node in &nodes {
            let score = health_score(&node.metrics);
            let target = status_for_score(score);
            match self.store.transition_status(&node.id, target) {
                Ok(true) => {
                    transitions += 1;
                    debug!(node = %node.id, score, status = %target, "health transition");
                }
                Ok(false) => {}
                // removed between the snapshot and the transition; the
                // next cycle sees the settled state
                Err(e) => warn!(node = %node.id, error = %e, "health check skipped"),
            }
            trigger |= needs_reoptimization(&node.metrics);
        }

        let dirty = self.optimizer.take_dirty();
        if trigger || dirty {
            let generation = self.optimizer.rebuild(&self.store.nodes());
            info!(
                cycle = self.cycle_count,
                degraded_trigger = trigger,
                topology_dirty = dirty,
                generation,
                "route table reoptimized"
            );
        }

        debug!(
            cycle = self.cycle_count,
            nodes = nodes.len(),
            transitions,
            "health cycle complete"
        );
    }
}
