//! # Meridian Geo
//!
//! Continental route optimization: scores wide-area node pairs by
//! geographic distance, backbone protocol overhead, bandwidth, and
//! reliability, and maintains a per-node table of up to three candidate
//! next-hops for redundancy.
//!
//! The table is coarse by design. Exact paths come from `meridian-routing`;
//! this crate answers "which neighbors should continental traffic prefer"
//! and keeps several answers alive so a single failure never strands a
//! region.

pub mod optimizer;
pub mod score;

pub use optimizer::*;
pub use score::*;
