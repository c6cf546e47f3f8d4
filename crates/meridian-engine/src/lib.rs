//! # Meridian Engine
//!
//! The mesh engine facade. [`MeshEngine`] assembles the topology store,
//! routing, the continental route optimizer, and the background tasks
//! (health monitor and telemetry drain) behind one lifecycle and exposes
//! the full query, mutation, and subscription API.
//!
//! ## Example
//!
//! ```rust,ignore
//! use meridian_engine::{EngineConfig, MeshEngine};
//! use meridian_core::{NodeKind, NodeSpec, Position};
//!
//! let engine = MeshEngine::new(EngineConfig::default());
//! engine.start().await?;
//!
//! engine.add_node(NodeSpec::new(
//!     "gateway-eu-1",
//!     NodeKind::Gateway,
//!     Position::geographic(50.11, 8.68, 100.0),
//! ))?;
//!
//! let path = engine.find_shortest_path(&"a".into(), &"b".into());
//! let report = engine.analyze_connectivity();
//!
//! engine.shutdown().await;
//! ```

mod config;
mod error;
pub mod logging;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use meridian_core::{
    EventKind, HandlerId, Link, LinkId, LinkMetricsUpdate, LinkSpec, Node, NodeId,
    NodeMetricsUpdate, NodeSpec, NodeStatus, Position, TopologyEvent, TopologyResult,
    TopologySnapshot,
};
use meridian_geo::{RouteCandidate, RouteOptimizer, RouteTableSnapshot};
use meridian_monitor::{
    HealthMonitor, TelemetrySink, TelemetryTask, TelemetryUpdate, telemetry_channel,
};
use meridian_routing::{ConnectivityReport, GraphSnapshot, analyze, shortest_path};
use meridian_topology::{NetworkMetrics, TopologyStore};

/// The assembled mesh engine
///
/// Owns the topology store, the continental route optimizer, and the two
/// periodic tasks. Queries and mutations delegate straight to the store
/// and may be called before `start()`; the background tasks only exist
/// between `start()` and `shutdown()`.
pub struct MeshEngine {
    config: EngineConfig,
    store: Arc<TopologyStore>,
    optimizer: Arc<RouteOptimizer>,
    sink: TelemetrySink,
    /// Consumed by the telemetry task at start
    telemetry_rx: std::sync::Mutex<Option<mpsc::Receiver<TelemetryUpdate>>>,
    shutdown_tx: broadcast::Sender<()>,
    background_tasks: RwLock<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl MeshEngine {
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(TopologyStore::new());
        let optimizer = Arc::new(RouteOptimizer::new(config.optimizer));
        let (sink, telemetry_rx) = telemetry_channel(config.telemetry_buffer);
        let (shutdown_tx, _) = broadcast::channel(1);

        // structural changes invalidate the comparative route table; the
        // next monitor cycle picks the flag up and rebuilds
        let dirty_target = Arc::clone(&optimizer);
        store.subscribe(EventKind::TopologyChanged, move |_| {
            dirty_target.mark_dirty();
        });

        Self {
            config,
            store,
            optimizer,
            sink,
            telemetry_rx: std::sync::Mutex::new(Some(telemetry_rx)),
            shutdown_tx,
            background_tasks: RwLock::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the health monitor and telemetry tasks
    #[instrument(skip(self))]
    pub async fn start(&self) -> EngineResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyStarted);
        }
        // restart after shutdown is not supported; the telemetry receiver
        // was consumed by the first start
        let Some(telemetry_rx) = self.telemetry_rx.lock().unwrap().take() else {
            self.started.store(false, Ordering::SeqCst);
            return Err(EngineError::AlreadyStarted);
        };

        let monitor_task = HealthMonitor::spawn(
            Arc::clone(&self.store),
            Arc::clone(&self.optimizer),
            self.config.health_check_interval,
            self.shutdown_tx.subscribe(),
        );
        let telemetry_task = TelemetryTask::spawn(
            Arc::clone(&self.store),
            telemetry_rx,
            self.config.telemetry_sync_interval,
            self.shutdown_tx.subscribe(),
        );

        {
            let mut tasks = self.background_tasks.write().await;
            tasks.push(monitor_task);
            tasks.push(telemetry_task);
        }

        info!("Engine started");
        Ok(())
    }

    /// Stop both periodic tasks, letting in-flight cycles finish
    ///
    /// Idempotent; a never-started engine shuts down as a no-op.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }

        let _ = self.shutdown_tx.send(());

        let mut tasks = self.background_tasks.write().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }

        info!("Engine stopped");
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Cloneable producer handle for buffered telemetry ingestion
    pub fn telemetry_sink(&self) -> TelemetrySink {
        self.sink.clone()
    }

    // Topology management

    pub fn add_node(&self, spec: NodeSpec) -> TopologyResult<Node> {
        self.store.add_node(spec)
    }

    pub fn remove_node(&self, id: &NodeId) -> TopologyResult<Node> {
        self.store.remove_node(id)
    }

    pub fn add_link(&self, spec: LinkSpec) -> TopologyResult<Link> {
        self.store.add_link(spec)
    }

    pub fn remove_link(&self, id: &LinkId) -> TopologyResult<Link> {
        self.store.remove_link(id)
    }

    // Telemetry ingestion (direct, synchronous)

    pub fn update_node_metrics(&self, id: &NodeId, update: NodeMetricsUpdate) -> TopologyResult<()> {
        self.store.update_node_metrics(id, update)
    }

    pub fn update_link_metrics(&self, id: &LinkId, update: LinkMetricsUpdate) -> TopologyResult<()> {
        self.store.update_link_metrics(id, update)
    }

    pub fn transition_status(&self, id: &NodeId, status: NodeStatus) -> TopologyResult<bool> {
        self.store.transition_status(id, status)
    }

    // Queries

    pub fn nodes(&self) -> Vec<Node> {
        self.store.nodes()
    }

    pub fn links(&self) -> Vec<Link> {
        self.store.links()
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.store.node(id)
    }

    pub fn link(&self, id: &LinkId) -> Option<Link> {
        self.store.link(id)
    }

    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        self.store.neighbors(id)
    }

    pub fn find_link_between(&self, a: &NodeId, b: &NodeId) -> Option<Link> {
        self.store.find_link_between(a, b)
    }

    pub fn nodes_in_range(&self, origin: &Position, radius: f64) -> Vec<Node> {
        self.store.nodes_in_range(origin, radius)
    }

    pub fn network_metrics(&self) -> NetworkMetrics {
        self.store.network_metrics()
    }

    pub fn snapshot(&self) -> TopologySnapshot {
        self.store.snapshot()
    }

    /// Latency-weighted shortest path over the current topology
    ///
    /// Empty when either endpoint is unknown or no active path exists.
    pub fn find_shortest_path(&self, source: &NodeId, target: &NodeId) -> Vec<NodeId> {
        let graph = GraphSnapshot::from(&self.store.snapshot());
        shortest_path(&graph, source, target)
    }

    /// Full structural analysis of the current topology
    pub fn analyze_connectivity(&self) -> ConnectivityReport {
        analyze(&GraphSnapshot::from(&self.store.snapshot()))
    }

    // Continental routing

    /// Rebuild the continental route table now; returns the new generation
    pub fn rebuild_routes(&self) -> u64 {
        self.optimizer.rebuild(&self.store.nodes())
    }

    pub fn route_table(&self) -> RouteTableSnapshot {
        self.optimizer.snapshot()
    }

    pub fn route_candidates(&self, id: &NodeId) -> Vec<RouteCandidate> {
        self.optimizer.candidates(id)
    }

    // Event subscription

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&TopologyEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(kind, handler)
    }

    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.store.unsubscribe(id)
    }
}

impl Default for MeshEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
