//! Error types for the Meridian engine

use thiserror::Error;

use crate::id::{LinkId, NodeId};

/// Errors returned by topology store operations
///
/// Unreachable destinations are deliberately absent: shortest-path and
/// route-table queries return empty results for them, which is a normal
/// outcome rather than an error.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The referenced node is not registered; mutations report this and
    /// leave the store untouched
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The referenced link is not registered
    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    /// Link creation named an endpoint that is not registered; the link
    /// is rejected and not stored
    #[error("Link {link} references unknown endpoint {node}")]
    UnknownEndpoint { link: LinkId, node: NodeId },

    /// Link creation named the same node on both ends
    #[error("Link {0} would connect a node to itself")]
    SelfLink(LinkId),

    /// A node with this id is already registered
    #[error("Node already exists: {0}")]
    NodeExists(NodeId),

    /// A link with this id is already registered
    #[error("Link already exists: {0}")]
    LinkExists(LinkId),
}

/// Result type alias for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;
