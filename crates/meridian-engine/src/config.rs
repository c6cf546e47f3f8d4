//! Configuration for the mesh engine

use std::time::Duration;

use meridian_geo::OptimizerConfig;

/// Configuration for a [`MeshEngine`](crate::MeshEngine)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the health monitor re-scores every node
    pub health_check_interval: Duration,
    /// How often the telemetry task drains the ingestion buffer
    pub telemetry_sync_interval: Duration,
    /// Telemetry buffer capacity; a full buffer drops readings
    pub telemetry_buffer: usize,
    /// Route optimizer tuning
    pub optimizer: OptimizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(30),
            telemetry_sync_interval: Duration::from_secs(5),
            telemetry_buffer: 1024,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the health monitor interval
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Set the telemetry drain interval
    pub fn with_telemetry_sync_interval(mut self, interval: Duration) -> Self {
        self.telemetry_sync_interval = interval;
        self
    }

    /// Set the telemetry buffer capacity
    pub fn with_telemetry_buffer(mut self, capacity: usize) -> Self {
        self.telemetry_buffer = capacity;
        self
    }

    /// Set the optimizer tuning
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }
}
