//! Node types: kinds, status, metrics, and the wide-area profile

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::position::Position;
use crate::protocol::TransportProtocol;

/// Role a node plays in the mesh
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[display("gateway")]
    Gateway,
    #[display("relay")]
    Relay,
    #[display("endpoint")]
    Endpoint,
    #[display("bridge")]
    Bridge,
}

/// Operational status of a node
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[display("online")]
    Online,
    #[display("offline")]
    Offline,
    #[display("degraded")]
    Degraded,
    #[display("error")]
    Error,
}

/// Reported performance metrics for a node
///
/// `uptime_pct`, `packet_loss_pct` and `temperature_c` feed the health
/// score; the rest inform routing and network-level aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Processing latency in milliseconds
    pub latency_ms: f64,
    /// Offered throughput in Mbps
    pub throughput_mbps: f64,
    /// Delivery reliability, 0..1
    pub reliability: f64,
    /// Remaining battery percentage for battery-powered nodes
    pub battery_pct: Option<f64>,
    /// Uptime percentage over the reporting window, 0..100
    pub uptime_pct: f64,
    /// Packet loss percentage over the reporting window, 0..100
    pub packet_loss_pct: f64,
    /// Enclosure temperature in degrees Celsius
    pub temperature_c: f64,
}

impl Default for NodeMetrics {
    /// A freshly provisioned node: perfect health, no load
    fn default() -> Self {
        Self {
            latency_ms: 0.0,
            throughput_mbps: 0.0,
            reliability: 1.0,
            battery_pct: None,
            uptime_pct: 100.0,
            packet_loss_pct: 0.0,
            temperature_c: 25.0,
        }
    }
}

impl NodeMetrics {
    /// Clamp every field into its documented range
    pub fn sanitized(mut self) -> Self {
        self.latency_ms = self.latency_ms.max(0.0);
        self.throughput_mbps = self.throughput_mbps.max(0.0);
        self.reliability = self.reliability.clamp(0.0, 1.0);
        self.battery_pct = self.battery_pct.map(|b| b.clamp(0.0, 100.0));
        self.uptime_pct = self.uptime_pct.clamp(0.0, 100.0);
        self.packet_loss_pct = self.packet_loss_pct.clamp(0.0, 100.0);
        self
    }
}

/// Partial update to [`NodeMetrics`]; `None` fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetricsUpdate {
    pub latency_ms: Option<f64>,
    pub throughput_mbps: Option<f64>,
    pub reliability: Option<f64>,
    pub battery_pct: Option<f64>,
    pub uptime_pct: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub temperature_c: Option<f64>,
}

impl NodeMetricsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency_ms(mut self, v: f64) -> Self {
        self.latency_ms = Some(v);
        self
    }

    pub fn with_throughput_mbps(mut self, v: f64) -> Self {
        self.throughput_mbps = Some(v);
        self
    }

    pub fn with_reliability(mut self, v: f64) -> Self {
        self.reliability = Some(v);
        self
    }

    pub fn with_battery_pct(mut self, v: f64) -> Self {
        self.battery_pct = Some(v);
        self
    }

    pub fn with_uptime_pct(mut self, v: f64) -> Self {
        self.uptime_pct = Some(v);
        self
    }

    pub fn with_packet_loss_pct(mut self, v: f64) -> Self {
        self.packet_loss_pct = Some(v);
        self
    }

    pub fn with_temperature_c(mut self, v: f64) -> Self {
        self.temperature_c = Some(v);
        self
    }

    /// Merge into `current`, clamping values to their documented ranges
    pub fn apply_to(&self, current: &mut NodeMetrics) {
        if let Some(v) = self.latency_ms {
            current.latency_ms = v.max(0.0);
        }
        if let Some(v) = self.throughput_mbps {
            current.throughput_mbps = v.max(0.0);
        }
        if let Some(v) = self.reliability {
            current.reliability = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.battery_pct {
            current.battery_pct = Some(v.clamp(0.0, 100.0));
        }
        if let Some(v) = self.uptime_pct {
            current.uptime_pct = v.clamp(0.0, 100.0);
        }
        if let Some(v) = self.packet_loss_pct {
            current.packet_loss_pct = v.clamp(0.0, 100.0);
        }
        if let Some(v) = self.temperature_c {
            current.temperature_c = v;
        }
    }
}

/// Capacity figures for a wide-area node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityProfile {
    /// Backbone bandwidth in Mbps
    pub bandwidth_mbps: f64,
    /// Concurrent connection limit
    pub max_connections: u32,
    /// Local buffer storage in GB
    pub storage_gb: f64,
}

impl CapacityProfile {
    pub fn new(bandwidth_mbps: f64, max_connections: u32, storage_gb: f64) -> Self {
        Self {
            bandwidth_mbps,
            max_connections,
            storage_gb,
        }
    }
}

/// Security posture metadata; descriptive only, routing never reads it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityProfile {
    /// Encryption class, e.g. "aes-256-gcm"
    pub encryption: String,
    pub certificates: Vec<String>,
    pub last_audit: Option<DateTime<Utc>>,
}

/// Marks a node as a continental (wide-area) participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideAreaProfile {
    /// Transports the node can terminate
    pub protocols: Vec<TransportProtocol>,
    pub capacity: CapacityProfile,
    #[serde(default)]
    pub security: SecurityProfile,
}

impl WideAreaProfile {
    pub fn new(protocols: Vec<TransportProtocol>, capacity: CapacityProfile) -> Self {
        Self {
            protocols,
            capacity,
            security: SecurityProfile::default(),
        }
    }

    pub fn with_security(mut self, security: SecurityProfile) -> Self {
        self.security = security;
        self
    }

    /// True when the node can terminate `protocol`
    pub fn supports(&self, protocol: TransportProtocol) -> bool {
        self.protocols.contains(&protocol)
    }
}

/// A mesh participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub status: NodeStatus,
    pub metrics: NodeMetrics,
    /// Present on continental nodes only
    pub wide_area: Option<WideAreaProfile>,
    /// Neighbor ids, maintained by the topology store; one entry per
    /// neighbor regardless of how many parallel links connect the pair
    pub connections: BTreeSet<NodeId>,
    /// When the node was last created, updated, or health-checked
    pub last_seen: DateTime<Utc>,
}

impl Node {
    /// True when the node participates in wide-area route optimization
    pub fn is_wide_area(&self) -> bool {
        self.wide_area.is_some() && self.position.is_geographic()
    }
}

/// Everything needed to register a node; the store fills in bookkeeping
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub status: NodeStatus,
    pub metrics: NodeMetrics,
    pub wide_area: Option<WideAreaProfile>,
}

impl NodeSpec {
    /// New spec with default metrics, online status, and the id as name
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Position) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            kind,
            position,
            status: NodeStatus::Online,
            metrics: NodeMetrics::default(),
            wide_area: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_metrics(mut self, metrics: NodeMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_wide_area(mut self, profile: WideAreaProfile) -> Self {
        self.wide_area = Some(profile);
        self
    }

    /// Materialize the node record
    pub fn into_node(self) -> Node {
        Node {
            id: self.id,
            name: self.name,
            kind: self.kind,
            position: self.position,
            status: self.status,
            metrics: self.metrics.sanitized(),
            wide_area: self.wide_area,
            connections: BTreeSet::new(),
            last_seen: Utc::now(),
        }
    }
}
