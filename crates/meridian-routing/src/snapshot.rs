//! Immutable graph arena for routing and analysis
//!
//! Construction sorts nodes and links by id, so adjacency iteration order
//! (and with it every tie-break downstream) is deterministic for a given
//! topology. Each link becomes one undirected edge record referenced from
//! both endpoints' incidence lists; parallel links stay distinct.

use std::collections::HashMap;

use meridian_core::{Link, LinkId, Node, NodeId, TopologySnapshot};

/// An undirected edge in the arena; one record per link
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub link_id: LinkId,
    /// Arena index of one endpoint
    pub a: usize,
    /// Arena index of the other endpoint
    pub b: usize,
    pub latency_ms: f64,
    /// Whether shortest-path traversal may use the edge; structural
    /// analysis ignores this flag
    pub active: bool,
}

impl EdgeRecord {
    /// The endpoint opposite `node`
    pub fn other(&self, node: usize) -> usize {
        if self.a == node { self.b } else { self.a }
    }
}

/// Immutable adjacency arena over a topology capture
pub struct GraphSnapshot {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    edges: Vec<EdgeRecord>,
    /// Edge indices incident to each node, in link-id order
    adjacency: Vec<Vec<usize>>,
}

impl GraphSnapshot {
    /// Build the arena from node and link records
    ///
    /// Links referencing a node absent from `nodes` are skipped; the store
    /// prevents them by construction, but the arena accepts arbitrary
    /// slices (tests build partial graphs directly).
    pub fn build(nodes: &[Node], links: &[Link]) -> Self {
        let mut ids: Vec<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids.dedup();

        let index: HashMap<NodeId, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut sorted: Vec<&Link> = links.iter().collect();
        sorted.sort_by(|x, y| x.id.cmp(&y.id));

        let mut edges = Vec::with_capacity(sorted.len());
        let mut adjacency = vec![Vec::new(); ids.len()];
        for link in sorted {
            let (Some(&a), Some(&b)) = (index.get(&link.source), index.get(&link.target)) else {
                continue;
            };
            let edge_idx = edges.len();
            edges.push(EdgeRecord {
                link_id: link.id.clone(),
                a,
                b,
                latency_ms: link.latency_ms,
                active: link.is_active(),
            });
            adjacency[a].push(edge_idx);
            adjacency[b].push(edge_idx);
        }

        Self {
            ids,
            index,
            edges,
            adjacency,
        }
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Arena index of a node id
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Node id at an arena index
    pub fn id_of(&self, index: usize) -> &NodeId {
        &self.ids[index]
    }

    /// All node ids in arena (sorted) order
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn edge(&self, index: usize) -> &EdgeRecord {
        &self.edges[index]
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    /// Incident edge indices of a node, in link-id order
    pub fn incident(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }
}

impl From<&TopologySnapshot> for GraphSnapshot {
    fn from(snapshot: &TopologySnapshot) -> Self {
        Self::build(&snapshot.nodes, &snapshot.links)
    }
}
