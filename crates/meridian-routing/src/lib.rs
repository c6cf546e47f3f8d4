//! # Meridian Routing
//!
//! Graph algorithms for the mesh: latency-weighted shortest paths and
//! structural robustness analysis (connected components, bridges,
//! articulation points, hop-count diameter).
//!
//! Everything here runs on a [`GraphSnapshot`], an immutable adjacency
//! arena built once from a topology capture. Analysis never mutates the
//! live store, so queries hold no write locks and repeated runs over the
//! same capture give identical results.

pub mod analysis;
pub mod dijkstra;
pub mod snapshot;

pub use analysis::*;
pub use dijkstra::*;
pub use snapshot::*;
