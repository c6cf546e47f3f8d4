//! Network-level aggregate metrics

use serde::{Deserialize, Serialize};

use meridian_core::{Link, Node, NodeStatus};

/// Aggregate view of the whole network, derived on demand
///
/// Empty populations yield 0.0 for every ratio and mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub total_nodes: usize,
    /// Nodes with status `online`; degraded nodes do not count
    pub active_nodes: usize,
    pub total_links: usize,
    /// Links with status `active`
    pub active_links: usize,
    /// Mean latency over active links
    pub average_latency_ms: f64,
    /// Summed node throughput over online nodes
    pub total_throughput_mbps: f64,
    /// Mean node reliability (0..1) over all nodes
    pub network_reliability: f64,
    /// Online share of all nodes, 0..100
    pub coverage_pct: f64,
}

impl NetworkMetrics {
    /// Derive the aggregate view from node and link records
    pub fn compute<'a, N, L>(nodes: N, links: L) -> Self
    where
        N: IntoIterator<Item = &'a Node>,
        L: IntoIterator<Item = &'a Link>,
    {
        let mut total_nodes = 0usize;
        let mut active_nodes = 0usize;
        let mut total_throughput_mbps = 0.0;
        let mut reliability_sum = 0.0;

        for node in nodes {
            total_nodes += 1;
            reliability_sum += node.metrics.reliability;
            if node.status == NodeStatus::Online {
                active_nodes += 1;
                total_throughput_mbps += node.metrics.throughput_mbps;
            }
        }

        let mut total_links = 0usize;
        let mut active_links = 0usize;
        let mut latency_sum = 0.0;

        for link in links {
            total_links += 1;
            if link.is_active() {
                active_links += 1;
                latency_sum += link.latency_ms;
            }
        }

        let average_latency_ms = if active_links > 0 {
            latency_sum / active_links as f64
        } else {
            0.0
        };
        let network_reliability = if total_nodes > 0 {
            reliability_sum / total_nodes as f64
        } else {
            0.0
        };
        let coverage_pct = if total_nodes > 0 {
            active_nodes as f64 / total_nodes as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_nodes,
            active_nodes,
            total_links,
            active_links,
            average_latency_ms,
            total_throughput_mbps,
            network_reliability,
            coverage_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use meridian_core::{
        LinkKind, LinkSpec, LinkStatus, NodeKind, NodeMetrics, NodeSpec, NodeStatus, Position,
    };

    use super::*;

    fn node(id: &str, status: NodeStatus, throughput: f64, reliability: f64) -> Node {
        let mut metrics = NodeMetrics::default();
        metrics.throughput_mbps = throughput;
        metrics.reliability = reliability;
        NodeSpec::new(id, NodeKind::Relay, Position::local(0.0, 0.0, 0.0))
            .with_status(status)
            .with_metrics(metrics)
            .into_node()
    }

    #[test]
    fn test_empty_network_is_all_zeroes() {
        let nodes: Vec<Node> = Vec::new();
        let links: Vec<Link> = Vec::new();
        let metrics = NetworkMetrics::compute(&nodes, &links);
        assert_eq!(metrics.total_nodes, 0);
        assert_eq!(metrics.average_latency_ms, 0.0);
        assert_eq!(metrics.network_reliability, 0.0);
        assert_eq!(metrics.coverage_pct, 0.0);
    }

    #[test]
    fn test_aggregates_split_by_status() {
        let nodes = vec![
            node("a", NodeStatus::Online, 100.0, 1.0),
            node("b", NodeStatus::Online, 50.0, 0.8),
            node("c", NodeStatus::Offline, 999.0, 0.6),
        ];
        let links = vec![
            LinkSpec::new("a", "b", LinkKind::Wifi)
                .with_id("l1")
                .with_latency_ms(10.0)
                .into_link(),
            LinkSpec::new("b", "c", LinkKind::Wifi)
                .with_id("l2")
                .with_latency_ms(30.0)
                .into_link(),
            LinkSpec::new("a", "c", LinkKind::Wifi)
                .with_id("l3")
                .with_latency_ms(999.0)
                .with_status(LinkStatus::Inactive)
                .into_link(),
        ];

        let metrics = NetworkMetrics::compute(&nodes, &links);

        assert_eq!(metrics.total_nodes, 3);
        assert_eq!(metrics.active_nodes, 2);
        assert_eq!(metrics.total_links, 3);
        assert_eq!(metrics.active_links, 2);
        // inactive link latency is excluded from the mean
        assert_eq!(metrics.average_latency_ms, 20.0);
        // offline node throughput is excluded from the total
        assert_eq!(metrics.total_throughput_mbps, 150.0);
        assert!((metrics.network_reliability - 0.8).abs() < 1e-9);
        assert!((metrics.coverage_pct - 200.0 / 3.0).abs() < 1e-9);
    }
}
