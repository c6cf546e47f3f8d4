//! The continental route table and its rebuild cycle

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use meridian_core::{Node, NodeId, NodeStatus};

use crate::score::{OptimizerConfig, RouteCandidate, evaluate_pair};

/// Point-in-time copy of the whole route table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTableSnapshot {
    /// Candidate lists keyed by source node, sorted ascending by score
    pub routes: BTreeMap<NodeId, Vec<RouteCandidate>>,
    /// Increments on every rebuild; 0 before the first
    pub generation: u64,
    pub rebuilt_at: Option<DateTime<Utc>>,
}

impl RouteTableSnapshot {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Redundancy-oriented routing table for wide-area deployments
///
/// Every wide-area node gets an ordered list of up to
/// [`OptimizerConfig::max_candidates`] scored next-hops. Rebuilds
/// repopulate the table in place; a reader racing a rebuild may briefly
/// see a source without candidates, which reads as Unreachable and is a
/// normal outcome. Individual candidate lists are always internally
/// consistent.
pub struct RouteOptimizer {
    config: OptimizerConfig,
    table: DashMap<NodeId, Vec<RouteCandidate>>,
    generation: AtomicU64,
    rebuilt_at: RwLock<Option<DateTime<Utc>>>,
    /// Set when topology changed since the last rebuild
    dirty: AtomicBool,
}

impl RouteOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            table: DashMap::new(),
            generation: AtomicU64::new(0),
            rebuilt_at: RwLock::new(None),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Flag the table as stale; the next monitor cycle rebuilds it
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Read and clear the dirty flag in one step
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    /// Rebuild the whole table from the current node set
    ///
    /// Every wide-area node gets a source entry regardless of its own
    /// status; `offline` and `error` nodes are excluded as next-hops.
    /// Route quality is comparative across the network, which is why the
    /// trigger conditions always rebuild everything rather than one entry.
    /// Returns the new generation.
    pub fn rebuild(&self, nodes: &[Node]) -> u64 {
        let wide_area: Vec<&Node> = nodes.iter().filter(|n| n.is_wide_area()).collect();

        let mut fresh: BTreeMap<NodeId, Vec<RouteCandidate>> = BTreeMap::new();
        for source in &wide_area {
            let mut candidates: Vec<RouteCandidate> = wide_area
                .iter()
                .filter(|target| target.id != source.id)
                .filter(|target| {
                    !matches!(target.status, NodeStatus::Offline | NodeStatus::Error)
                })
                .filter_map(|target| evaluate_pair(source, target, &self.config))
                .collect();
            candidates.sort_by(|x, y| {
                x.score
                    .total_cmp(&y.score)
                    .then_with(|| x.next_hop.cmp(&y.next_hop))
            });
            candidates.truncate(self.config.max_candidates);
            debug!(
                source = %source.id,
                candidates = candidates.len(),
                "scored next-hop candidates"
            );
            fresh.insert(source.id.clone(), candidates);
        }

        self.table.retain(|id, _| fresh.contains_key(id));
        for (id, candidates) in fresh {
            self.table.insert(id, candidates);
        }

        self.dirty.store(false, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.rebuilt_at.write().unwrap() = Some(Utc::now());

        info!(
            generation,
            sources = self.table.len(),
            wide_area = wide_area.len(),
            total = nodes.len(),
            "continental route table rebuilt"
        );
        generation
    }

    /// Candidate list for one source, ordered ascending by score
    ///
    /// Empty when the node is unknown, not wide-area, or has no valid
    /// peers.
    pub fn candidates(&self, id: &NodeId) -> Vec<RouteCandidate> {
        self.table.get(id).map(|e| e.value().clone()).unwrap_or_default()
    }

    /// Rebuild generation; 0 until the first rebuild completes
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Copy of the full table with its metadata
    pub fn snapshot(&self) -> RouteTableSnapshot {
        let routes: BTreeMap<NodeId, Vec<RouteCandidate>> = self
            .table
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        RouteTableSnapshot {
            routes,
            generation: self.generation(),
            rebuilt_at: *self.rebuilt_at.read().unwrap(),
        }
    }

    pub fn source_count(&self) -> usize {
        self.table.len()
    }
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}
