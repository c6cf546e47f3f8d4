//! Link types: kinds, status, and the undirected link record

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::id::{LinkId, NodeId};
use crate::protocol::TransportProtocol;

/// Physical class of a link
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    #[display("lora")]
    Lora,
    #[display("wifi")]
    Wifi,
    #[display("dtn")]
    Dtn,
    #[display("satellite")]
    Satellite,
}

/// Operational status of a link; only `active` links carry traffic
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    #[display("active")]
    Active,
    #[display("inactive")]
    Inactive,
    #[display("congested")]
    Congested,
}

/// An undirected connection between two nodes
///
/// A single record represents both directions; `source`/`target` name the
/// endpoints without implying traffic direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: LinkKind,
    /// Transports carried, for continental links; empty for local links
    pub protocols: Vec<TransportProtocol>,
    /// Signal strength, 0..1
    pub strength: f64,
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub status: LinkStatus,
    /// Monotonic traffic counter
    pub packets: u64,
    /// Monotonic error counter
    pub errors: u64,
    pub last_seen: DateTime<Utc>,
}

impl Link {
    /// The endpoint opposite `id`, when `id` is one of the two
    pub fn peer_of(&self, id: &NodeId) -> Option<&NodeId> {
        if self.source == *id {
            Some(&self.target)
        } else if self.target == *id {
            Some(&self.source)
        } else {
            None
        }
    }

    /// True when the link connects `a` and `b`, in either orientation
    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (self.source == *a && self.target == *b) || (self.source == *b && self.target == *a)
    }

    pub fn is_active(&self) -> bool {
        self.status == LinkStatus::Active
    }
}

/// Everything needed to register a link; the store validates endpoints
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: LinkKind,
    pub protocols: Vec<TransportProtocol>,
    pub strength: f64,
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub status: LinkStatus,
}

impl LinkSpec {
    /// New spec with a generated id; defaults describe a healthy short link
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, kind: LinkKind) -> Self {
        Self {
            id: LinkId::generate(),
            source: source.into(),
            target: target.into(),
            kind,
            protocols: Vec::new(),
            strength: 1.0,
            latency_ms: 1.0,
            bandwidth_mbps: 100.0,
            status: LinkStatus::Active,
        }
    }

    pub fn with_id(mut self, id: impl Into<LinkId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_protocols(mut self, protocols: Vec<TransportProtocol>) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn with_strength(mut self, v: f64) -> Self {
        self.strength = v;
        self
    }

    pub fn with_latency_ms(mut self, v: f64) -> Self {
        self.latency_ms = v;
        self
    }

    pub fn with_bandwidth_mbps(mut self, v: f64) -> Self {
        self.bandwidth_mbps = v;
        self
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = status;
        self
    }

    /// Materialize the link record with zeroed counters
    pub fn into_link(self) -> Link {
        Link {
            id: self.id,
            source: self.source,
            target: self.target,
            kind: self.kind,
            protocols: self.protocols,
            strength: self.strength.clamp(0.0, 1.0),
            latency_ms: self.latency_ms.max(0.0),
            bandwidth_mbps: self.bandwidth_mbps.max(0.0),
            status: self.status,
            packets: 0,
            errors: 0,
            last_seen: Utc::now(),
        }
    }
}

/// Partial update to link telemetry; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkMetricsUpdate {
    pub strength: Option<f64>,
    pub latency_ms: Option<f64>,
    pub bandwidth_mbps: Option<f64>,
    pub status: Option<LinkStatus>,
    /// Counter reading; values below the stored count are ignored
    pub packets: Option<u64>,
    /// Counter reading; values below the stored count are ignored
    pub errors: Option<u64>,
}

impl LinkMetricsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strength(mut self, v: f64) -> Self {
        self.strength = Some(v);
        self
    }

    pub fn with_latency_ms(mut self, v: f64) -> Self {
        self.latency_ms = Some(v);
        self
    }

    pub fn with_bandwidth_mbps(mut self, v: f64) -> Self {
        self.bandwidth_mbps = Some(v);
        self
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_packets(mut self, v: u64) -> Self {
        self.packets = Some(v);
        self
    }

    pub fn with_errors(mut self, v: u64) -> Self {
        self.errors = Some(v);
        self
    }

    /// Merge into `link`, clamping ranges and keeping counters monotonic
    pub fn apply_to(&self, link: &mut Link) {
        if let Some(v) = self.strength {
            link.strength = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.latency_ms {
            link.latency_ms = v.max(0.0);
        }
        if let Some(v) = self.bandwidth_mbps {
            link.bandwidth_mbps = v.max(0.0);
        }
        if let Some(v) = self.status {
            link.status = v;
        }
        if let Some(v) = self.packets {
            link.packets = link.packets.max(v);
        }
        if let Some(v) = self.errors {
            link.errors = link.errors.max(v);
        }
    }
}
