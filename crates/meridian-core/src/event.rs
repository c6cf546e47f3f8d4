//! Topology events

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::link::Link;
use crate::node::Node;

/// Events emitted synchronously by the topology store on every mutation
///
/// Payloads are full records so subscribers never have to query back into
/// the store from inside a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyEvent {
    /// A node joined the topology
    NodeAdded {
        node: Node,
        timestamp: DateTime<Utc>,
    },

    /// A node was removed; `node` is the final record with its links
    /// already detached
    NodeRemoved {
        node: Node,
        timestamp: DateTime<Utc>,
    },

    /// Node metrics or status changed
    NodeUpdated {
        node: Node,
        timestamp: DateTime<Utc>,
    },

    /// A link joined the topology
    LinkAdded {
        link: Link,
        timestamp: DateTime<Utc>,
    },

    /// A link was removed, explicitly or by node-removal cascade
    LinkRemoved {
        link: Link,
        timestamp: DateTime<Utc>,
    },

    /// Link telemetry or status changed
    LinkUpdated {
        link: Link,
        timestamp: DateTime<Utc>,
    },

    /// Structural change summary, emitted once after the specific events
    /// of a mutation; carries the new totals
    TopologyChanged {
        nodes: usize,
        links: usize,
        timestamp: DateTime<Utc>,
    },
}

impl TopologyEvent {
    /// The subscription kind this event dispatches under
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NodeAdded { .. } => EventKind::NodeAdded,
            Self::NodeRemoved { .. } => EventKind::NodeRemoved,
            Self::NodeUpdated { .. } => EventKind::NodeUpdated,
            Self::LinkAdded { .. } => EventKind::LinkAdded,
            Self::LinkRemoved { .. } => EventKind::LinkRemoved,
            Self::LinkUpdated { .. } => EventKind::LinkUpdated,
            Self::TopologyChanged { .. } => EventKind::TopologyChanged,
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::NodeAdded { timestamp, .. } => *timestamp,
            Self::NodeRemoved { timestamp, .. } => *timestamp,
            Self::NodeUpdated { timestamp, .. } => *timestamp,
            Self::LinkAdded { timestamp, .. } => *timestamp,
            Self::LinkRemoved { timestamp, .. } => *timestamp,
            Self::LinkUpdated { timestamp, .. } => *timestamp,
            Self::TopologyChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Create a node added event
    pub fn node_added(node: Node) -> Self {
        Self::NodeAdded {
            node,
            timestamp: Utc::now(),
        }
    }

    /// Create a node removed event
    pub fn node_removed(node: Node) -> Self {
        Self::NodeRemoved {
            node,
            timestamp: Utc::now(),
        }
    }

    /// Create a node updated event
    pub fn node_updated(node: Node) -> Self {
        Self::NodeUpdated {
            node,
            timestamp: Utc::now(),
        }
    }

    /// Create a link added event
    pub fn link_added(link: Link) -> Self {
        Self::LinkAdded {
            link,
            timestamp: Utc::now(),
        }
    }

    /// Create a link removed event
    pub fn link_removed(link: Link) -> Self {
        Self::LinkRemoved {
            link,
            timestamp: Utc::now(),
        }
    }

    /// Create a link updated event
    pub fn link_updated(link: Link) -> Self {
        Self::LinkUpdated {
            link,
            timestamp: Utc::now(),
        }
    }

    /// Create a topology changed event from the new totals
    pub fn topology_changed(nodes: usize, links: usize) -> Self {
        Self::TopologyChanged {
            nodes,
            links,
            timestamp: Utc::now(),
        }
    }
}

/// Subscription key for [`TopologyEvent`]s
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[display("node_added")]
    NodeAdded,
    #[display("node_removed")]
    NodeRemoved,
    #[display("node_updated")]
    NodeUpdated,
    #[display("link_added")]
    LinkAdded,
    #[display("link_removed")]
    LinkRemoved,
    #[display("link_updated")]
    LinkUpdated,
    #[display("topology_changed")]
    TopologyChanged,
}
