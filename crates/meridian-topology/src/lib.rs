//! # Meridian Topology
//!
//! Thread-safe network state for the mesh: the [`TopologyStore`] holds the
//! node and link registries, enforces graph invariants (bidirectional
//! neighbor sets, cascading detachment on node removal), and publishes
//! typed change events through the [`EventBus`].
//!
//! Mutations are serialized; queries run concurrently and only ever see
//! fully applied state.

pub mod bus;
pub mod metrics;
pub mod store;

pub use bus::*;
pub use metrics::*;
pub use store::*;
