//! Node health scoring rules

use meridian_core::{NodeMetrics, NodeStatus};

/// Score below which a node is considered offline
pub const OFFLINE_THRESHOLD: f64 = 30.0;

/// Score below which a node is considered degraded
pub const DEGRADED_THRESHOLD: f64 = 60.0;

/// Node latency above which the route table is rebuilt, ms
pub const REOPTIMIZE_LATENCY_MS: f64 = 100.0;

/// Packet loss above which the route table is rebuilt, percent
pub const REOPTIMIZE_LOSS_PCT: f64 = 5.0;

/// Ideal enclosure temperature; deviation in either direction costs score
pub const NOMINAL_TEMPERATURE_C: f64 = 25.0;

/// Composite health score in 0..100
///
/// Uptime and delivery each weigh 0.3; latency and thermal headroom 0.2
/// each. The latency and temperature terms floor at zero so one extreme
/// reading cannot drag the score negative.
pub fn health_score(metrics: &NodeMetrics) -> f64 {
    let uptime = metrics.uptime_pct;
    let delivery = 100.0 - metrics.packet_loss_pct;
    let latency = (100.0 - metrics.latency_ms).max(0.0);
    let thermal = (100.0 - (metrics.temperature_c - NOMINAL_TEMPERATURE_C).abs()).max(0.0);

    0.3 * uptime + 0.3 * delivery + 0.2 * latency + 0.2 * thermal
}

/// Status a node should hold at a given health score
pub fn status_for_score(score: f64) -> NodeStatus {
    if score < OFFLINE_THRESHOLD {
        NodeStatus::Offline
    } else if score < DEGRADED_THRESHOLD {
        NodeStatus::Degraded
    } else {
        NodeStatus::Online
    }
}

/// True when this node's readings warrant a full route-table rebuild
///
/// Route quality is comparative across the whole network, so one node
/// crossing either threshold invalidates every entry, not just its own.
pub fn needs_reoptimization(metrics: &NodeMetrics) -> bool {
    metrics.latency_ms > REOPTIMIZE_LATENCY_MS || metrics.packet_loss_pct > REOPTIMIZE_LOSS_PCT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(uptime: f64, loss: f64, latency: f64, temperature: f64) -> NodeMetrics {
        let mut m = NodeMetrics::default();
        m.uptime_pct = uptime;
        m.packet_loss_pct = loss;
        m.latency_ms = latency;
        m.temperature_c = temperature;
        m
    }

    #[test]
    fn test_nominal_node_scores_full_marks() {
        let score = health_score(&metrics(100.0, 0.0, 0.0, 25.0));
        assert_eq!(score, 100.0);
        assert_eq!(status_for_score(score), NodeStatus::Online);
    }

    #[test]
    fn test_low_uptime_alone_stays_online() {
        // 0.3*20 + 0.3*100 + 0.2*100 + 0.2*100 = 76
        let score = health_score(&metrics(20.0, 0.0, 0.0, 25.0));
        assert!((score - 76.0).abs() < 1e-9);
        assert_eq!(status_for_score(score), NodeStatus::Online);
    }

    #[test]
    fn test_combined_degradation_is_degraded() {
        // 0.3*50 + 0.3*50 + 0.2*0 + 0.2*100 = 50
        let score = health_score(&metrics(50.0, 50.0, 100.0, 25.0));
        assert!((score - 50.0).abs() < 1e-9);
        assert_eq!(status_for_score(score), NodeStatus::Degraded);
    }

    #[test]
    fn test_near_dead_node_is_offline() {
        // 0.3*10 + 0.3*20 + 0.2*0 + 0.2*55 = 20
        let score = health_score(&metrics(10.0, 80.0, 150.0, 70.0));
        assert!((score - 20.0).abs() < 1e-9);
        assert_eq!(status_for_score(score), NodeStatus::Offline);
    }

    #[test]
    fn test_latency_and_thermal_terms_floor_at_zero() {
        // latency 500 and temperature 200 would both go deeply negative
        let score = health_score(&metrics(100.0, 0.0, 500.0, 200.0));
        assert!((score - 60.0).abs() < 1e-9);
        assert_eq!(status_for_score(score), NodeStatus::Online);
    }

    #[test]
    fn test_cold_runs_cost_like_hot_runs() {
        let hot = health_score(&metrics(100.0, 0.0, 0.0, 45.0));
        let cold = health_score(&metrics(100.0, 0.0, 0.0, 5.0));
        assert!((hot - cold).abs() < 1e-9);
        assert!(hot < 100.0);
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(status_for_score(29.999), NodeStatus::Offline);
        assert_eq!(status_for_score(30.0), NodeStatus::Degraded);
        assert_eq!(status_for_score(59.999), NodeStatus::Degraded);
        assert_eq!(status_for_score(60.0), NodeStatus::Online);
    }

    #[test]
    fn test_reoptimization_triggers() {
        assert!(!needs_reoptimization(&metrics(100.0, 0.0, 0.0, 25.0)));
        assert!(!needs_reoptimization(&metrics(100.0, 5.0, 100.0, 25.0)));
        assert!(needs_reoptimization(&metrics(100.0, 0.0, 100.1, 25.0)));
        assert!(needs_reoptimization(&metrics(100.0, 5.1, 0.0, 25.0)));
    }
}
