//! # Meridian Monitor
//!
//! Adaptive health monitoring for the mesh:
//!
//! - [`health_score`] / [`status_for_score`]: the pure scoring rules
//! - [`HealthMonitor`]: periodic task that re-scores every node,
//!   transitions status, and rebuilds the continental route table when
//!   conditions degrade or topology changed
//! - [`TelemetrySink`] / [`TelemetryTask`]: buffered ingestion channel for
//!   external metric producers, drained on a faster tick
//!
//! The tasks never fabricate metrics; they only recompute derived state
//! from whatever telemetry producers last reported.

pub mod health;
pub mod monitor;
pub mod telemetry;

pub use health::*;
pub use monitor::*;
pub use telemetry::*;
