//! Structural robustness analysis
//!
//! Connected components, bridges, articulation points, and hop-count
//! diameter over the snapshot arena. Components and the critical-element
//! search consider every link regardless of status (an inactive link still
//! ties the graph together structurally); diameter follows traversal rules
//! and uses active links only.
//!
//! Bridges and articulation points come from one low-link DFS pass rather
//! than remove-and-reprobe, so analysis never touches the live store.

use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use meridian_core::{LinkId, NodeId};

use crate::snapshot::GraphSnapshot;

/// Result of a full connectivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// Connected components, each sorted by node id, ordered by their
    /// smallest member
    pub components: Vec<Vec<NodeId>>,
    /// Links whose removal disconnects the graph, sorted by id
    pub bridges: Vec<LinkId>,
    /// Nodes whose removal increases the component count, sorted by id
    pub articulation_points: Vec<NodeId>,
    /// Longest shortest-path hop count between any two reachable nodes
    pub diameter: usize,
    pub analyzed_at: DateTime<Utc>,
}

impl ConnectivityReport {
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// True when every node can reach every other node
    pub fn is_fully_connected(&self) -> bool {
        self.components.len() <= 1
    }
}

/// Run the full structural analysis over a snapshot
pub fn analyze(graph: &GraphSnapshot) -> ConnectivityReport {
    let started = Instant::now();
    let components = connected_components(graph);
    let (bridges, articulation_points) = critical_elements(graph);
    let diameter = diameter(graph);

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        components = components.len(),
        bridges = bridges.len(),
        articulation_points = articulation_points.len(),
        diameter,
        elapsed_us = started.elapsed().as_micros() as u64,
        "connectivity analysis complete"
    );

    ConnectivityReport {
        components,
        bridges,
        articulation_points,
        diameter,
        analyzed_at: Utc::now(),
    }
}

/// Connected components over all links, ignoring status
///
/// Each component is sorted by node id; components are ordered by their
/// smallest member. Since the arena itself is sorted, starting the scan at
/// index 0 yields both orderings for free.
pub fn connected_components(graph: &GraphSnapshot) -> Vec<Vec<NodeId>> {
    let n = graph.node_count();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut member_indices = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(node) = stack.pop() {
            member_indices.push(node);
            for &edge_idx in graph.incident(node) {
                let next = graph.edge(edge_idx).other(node);
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        member_indices.sort_unstable();
        components.push(
            member_indices
                .into_iter()
                .map(|i| graph.id_of(i).clone())
                .collect(),
        );
    }

    components
}

/// Links whose removal disconnects the graph, sorted by id
pub fn bridges(graph: &GraphSnapshot) -> Vec<LinkId> {
    critical_elements(graph).0
}

/// Nodes whose removal increases the component count, sorted by id
pub fn articulation_points(graph: &GraphSnapshot) -> Vec<NodeId> {
    critical_elements(graph).1
}

/// DFS bookkeeping for the low-link pass
struct LowLink<'g> {
    graph: &'g GraphSnapshot,
    disc: Vec<usize>,
    low: Vec<usize>,
    clock: usize,
    bridge_edges: Vec<usize>,
    cut_vertices: Vec<bool>,
}

const UNDISCOVERED: usize = usize::MAX;

impl<'g> LowLink<'g> {
    fn new(graph: &'g GraphSnapshot) -> Self {
        let n = graph.node_count();
        Self {
            graph,
            disc: vec![UNDISCOVERED; n],
            low: vec![0; n],
            clock: 0,
            bridge_edges: Vec::new(),
            cut_vertices: vec![false; n],
        }
    }

    /// One DFS tree rooted at `root`
    ///
    /// Iterative with an explicit frame stack, so pathological chains
    /// cannot overflow the call stack. Only the entry edge index is
    /// excluded on the way back up; a parallel link to the parent counts
    /// as a back edge, which is what keeps doubled links off the bridge
    /// list.
    fn dfs(&mut self, root: usize) {
        struct Frame {
            node: usize,
            entry_edge: Option<usize>,
            next_incident: usize,
        }

        let mut stack = vec![Frame {
            node: root,
            entry_edge: None,
            next_incident: 0,
        }];
        self.disc[root] = self.clock;
        self.low[root] = self.clock;
        self.clock += 1;
        let mut root_children = 0;

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            if let Some(&edge_idx) = self.graph.incident(node).get(frame.next_incident) {
                frame.next_incident += 1;
                if frame.entry_edge == Some(edge_idx) {
                    continue;
                }
                let next = self.graph.edge(edge_idx).other(node);
                if self.disc[next] == UNDISCOVERED {
                    if node == root {
                        root_children += 1;
                    }
                    self.disc[next] = self.clock;
                    self.low[next] = self.clock;
                    self.clock += 1;
                    stack.push(Frame {
                        node: next,
                        entry_edge: Some(edge_idx),
                        next_incident: 0,
                    });
                } else {
                    self.low[node] = self.low[node].min(self.disc[next]);
                }
            } else {
                let entry = frame.entry_edge;
                stack.pop();
                let Some(parent_frame) = stack.last_mut() else {
                    break;
                };
                let parent = parent_frame.node;
                self.low[parent] = self.low[parent].min(self.low[node]);
                if self.low[node] > self.disc[parent] {
                    // no back edge out of the subtree: the entry edge is
                    // the only way across
                    if let Some(edge_idx) = entry {
                        self.bridge_edges.push(edge_idx);
                    }
                }
                if parent != root && self.low[node] >= self.disc[parent] {
                    self.cut_vertices[parent] = true;
                }
            }
        }

        if root_children >= 2 {
            self.cut_vertices[root] = true;
        }
    }
}

/// Bridges and articulation points in one low-link pass, each sorted by id
fn critical_elements(graph: &GraphSnapshot) -> (Vec<LinkId>, Vec<NodeId>) {
    let mut state = LowLink::new(graph);
    for node in 0..graph.node_count() {
        if state.disc[node] == UNDISCOVERED {
            state.dfs(node);
        }
    }

    let mut bridges: Vec<LinkId> = state
        .bridge_edges
        .iter()
        .map(|&e| graph.edge(e).link_id.clone())
        .collect();
    bridges.sort();

    let articulation_points: Vec<NodeId> = state
        .cut_vertices
        .iter()
        .enumerate()
        .filter(|&(_, &cut)| cut)
        .map(|(i, _)| graph.id_of(i).clone())
        .collect();

    (bridges, articulation_points)
}

/// Longest shortest-path hop count between any two reachable nodes
///
/// BFS from every node over active links only; unreachable pairs do not
/// contribute. Empty and edgeless graphs have diameter 0.
pub fn diameter(graph: &GraphSnapshot) -> usize {
    let n = graph.node_count();
    let mut max_hops = 0;
    let mut hops = vec![usize::MAX; n];
    let mut queue = VecDeque::new();

    for start in 0..n {
        hops.fill(usize::MAX);
        hops[start] = 0;
        queue.clear();
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            max_hops = max_hops.max(hops[node]);
            for &edge_idx in graph.incident(node) {
                let edge = graph.edge(edge_idx);
                if !edge.active {
                    continue;
                }
                let next = edge.other(node);
                if hops[next] == usize::MAX {
                    hops[next] = hops[node] + 1;
                    queue.push_back(next);
                }
            }
        }
    }

    max_hops
}
