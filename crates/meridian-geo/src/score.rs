//! Candidate scoring for wide-area node pairs

use serde::{Deserialize, Serialize};

use meridian_core::{Node, NodeId, TransportProtocol};

/// Tuning constants for the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Fiber-equivalent propagation speed in km per millisecond
    /// (roughly two thirds of c in glass)
    pub reference_speed_km_per_ms: f64,
    /// Backbone capacity against which bandwidth is normalized, in Mbps
    pub reference_bandwidth_mbps: f64,
    /// Candidates retained per source node
    pub max_candidates: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            reference_speed_km_per_ms: 200.0,
            reference_bandwidth_mbps: 1000.0,
            max_candidates: 3,
        }
    }
}

impl OptimizerConfig {
    pub fn with_reference_speed(mut self, km_per_ms: f64) -> Self {
        self.reference_speed_km_per_ms = km_per_ms;
        self
    }

    pub fn with_max_candidates(mut self, count: usize) -> Self {
        self.max_candidates = count;
        self
    }
}

/// One scored next-hop option for a source node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub next_hop: NodeId,
    /// Great-circle distance between the pair, km
    pub distance_km: f64,
    /// Estimated one-way latency: propagation at the reference speed,
    /// scaled by the protocol overhead, plus mean processing latency
    pub latency_ms: f64,
    /// min of the two capacity bandwidths
    pub bandwidth_mbps: f64,
    /// Mean uptime of the pair, 0..100
    pub reliability_pct: f64,
    /// Best common backbone transport carrying the estimate
    pub protocol: TransportProtocol,
    /// Composite cost; lower is better
    pub score: f64,
}

/// The shared backbone transport with the lowest overhead factor
///
/// `None` when the pair shares no backbone-capable transport, in which
/// case no direct continental route exists between them.
pub fn best_common_transport(a: &Node, b: &Node) -> Option<TransportProtocol> {
    let (pa, pb) = (a.wide_area.as_ref()?, b.wide_area.as_ref()?);
    pa.protocols
        .iter()
        .filter(|p| pb.protocols.contains(p))
        .filter_map(|p| p.backbone_overhead().map(|overhead| (*p, overhead)))
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(p, _)| p)
}

/// Score `target` as a next-hop candidate for `source`
///
/// `None` when either node lacks a wide-area profile or geographic
/// placement, or the pair shares no backbone transport. The composite
/// weighs latency at 0.4 and reliability and inverse bandwidth at 0.3
/// each; all three terms live in a comparable 0-ish..300 range under the
/// default config.
pub fn evaluate_pair(
    source: &Node,
    target: &Node,
    config: &OptimizerConfig,
) -> Option<RouteCandidate> {
    if !source.is_wide_area() || !target.is_wide_area() {
        return None;
    }
    let protocol = best_common_transport(source, target)?;
    let overhead = protocol.backbone_overhead()?;
    let distance_km = source.position.distance_to(&target.position)?;

    let processing_ms = (source.metrics.latency_ms + target.metrics.latency_ms) / 2.0;
    let latency_ms = distance_km / config.reference_speed_km_per_ms * overhead + processing_ms;

    let (ca, cb) = (
        &source.wide_area.as_ref()?.capacity,
        &target.wide_area.as_ref()?.capacity,
    );
    let bandwidth_mbps = ca.bandwidth_mbps.min(cb.bandwidth_mbps);
    let reliability_pct = (source.metrics.uptime_pct + target.metrics.uptime_pct) / 2.0;

    let inverse_bandwidth = config.reference_bandwidth_mbps / bandwidth_mbps.max(1.0);
    let score = 0.4 * latency_ms + 0.3 * (100.0 - reliability_pct) + 0.3 * inverse_bandwidth;

    Some(RouteCandidate {
        next_hop: target.id.clone(),
        distance_km,
        latency_ms,
        bandwidth_mbps,
        reliability_pct,
        protocol,
        score,
    })
}
