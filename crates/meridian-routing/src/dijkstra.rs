//! Latency-weighted shortest paths
//!
//! Dijkstra over the snapshot arena with link latency as edge weight; only
//! `active` links are traversable. An unreachable target yields an empty
//! path, which is a normal outcome rather than an error.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use meridian_core::NodeId;

use crate::snapshot::GraphSnapshot;

/// Pending heap entry; pops by lowest cost, then earliest push
#[derive(Debug, Clone, Copy)]
struct Visit {
    cost: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for Visit {}

impl Ord for Visit {
    // BinaryHeap is a max-heap; reverse both keys so the cheapest,
    // earliest-discovered entry pops first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Latency-weighted shortest path between two nodes
///
/// Returns the node sequence from `source` to `target` inclusive:
/// `[source]` when the two coincide, empty when either id is unknown or no
/// active path exists. Ties in total latency are broken by discovery
/// order, which the sorted arena makes deterministic.
pub fn shortest_path(graph: &GraphSnapshot, source: &NodeId, target: &NodeId) -> Vec<NodeId> {
    let (Some(src), Some(dst)) = (graph.index_of(source), graph.index_of(target)) else {
        return Vec::new();
    };
    if src == dst {
        return vec![graph.id_of(src).clone()];
    }

    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    dist[src] = 0.0;
    heap.push(Visit {
        cost: 0.0,
        seq,
        node: src,
    });

    while let Some(Visit { cost, node, .. }) = heap.pop() {
        if settled[node] {
            continue;
        }
        settled[node] = true;
        if node == dst {
            break;
        }

        for &edge_idx in graph.incident(node) {
            let edge = graph.edge(edge_idx);
            if !edge.active {
                continue;
            }
            let next = edge.other(node);
            let next_cost = cost + edge.latency_ms;
            // strictly-less keeps the first discovery on equal cost
            if next_cost < dist[next] {
                dist[next] = next_cost;
                prev[next] = Some(node);
                seq += 1;
                heap.push(Visit {
                    cost: next_cost,
                    seq,
                    node: next,
                });
            }
        }
    }

    if !settled[dst] {
        return Vec::new();
    }

    let mut path = vec![graph.id_of(dst).clone()];
    let mut cursor = dst;
    while let Some(parent) = prev[cursor] {
        path.push(graph.id_of(parent).clone());
        cursor = parent;
    }
    path.reverse();
    path
}

/// Total latency along a path, using the cheapest active link between each
/// consecutive pair
///
/// `None` when the path is empty or any hop has no active link; a
/// single-node path costs 0.
pub fn path_latency(graph: &GraphSnapshot, path: &[NodeId]) -> Option<f64> {
    if path.is_empty() {
        return None;
    }

    let mut total = 0.0;
    for pair in path.windows(2) {
        let from = graph.index_of(&pair[0])?;
        let to = graph.index_of(&pair[1])?;
        let hop = graph
            .incident(from)
            .iter()
            .map(|&e| graph.edge(e))
            .filter(|edge| edge.active && edge.other(from) == to)
            .map(|edge| edge.latency_ms)
            .min_by(|x, y| x.total_cmp(y))?;
        total += hop;
    }
    Some(total)
}
