//! Point-in-time topology capture

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::link::Link;
use crate::node::Node;

/// Immutable capture of the whole topology
///
/// Contents are sorted by id so repeated captures of the same state are
/// byte-identical after serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub captured_at: DateTime<Utc>,
}

impl TopologySnapshot {
    pub fn new(mut nodes: Vec<Node>, mut links: Vec<Link>) -> Self {
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        links.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            nodes,
            links,
            captured_at: Utc::now(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
