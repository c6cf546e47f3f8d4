//! # Meridian Core
//!
//! Shared types for the Meridian mesh engine: the graph vocabulary every
//! other crate in the workspace speaks.
//!
//! ## Key Types
//!
//! - [`Node`] / [`Link`]: the topology graph elements, with
//!   [`NodeSpec`] / [`LinkSpec`] builders for registration
//! - [`NodeMetricsUpdate`] / [`LinkMetricsUpdate`]: partial telemetry merges
//! - [`Position`]: local or geographic placement with distance math
//! - [`TopologyEvent`] / [`EventKind`]: typed mutation events
//! - [`TopologyError`]: the error taxonomy for store operations
//! - [`TopologySnapshot`]: immutable point-in-time capture

pub mod error;
pub mod event;
pub mod id;
pub mod link;
pub mod node;
pub mod position;
pub mod protocol;
pub mod snapshot;

// Re-export main types
pub use error::*;
pub use event::*;
pub use id::*;
pub use link::*;
pub use node::*;
pub use position::*;
pub use protocol::*;
pub use snapshot::*;
