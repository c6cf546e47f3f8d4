//! The topology store: single source of truth for nodes and links
//!
//! All mutations go through one mutation guard, so cascading updates (node
//! removal detaching links and cleaning neighbor sets) appear atomic to
//! readers, and events leave the store in exactly the order mutations
//! happened. The registries themselves sit behind a read/write lock so
//! queries run concurrently with each other and only ever observe fully
//! applied mutations.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use tracing::debug;

use meridian_core::{
    EventKind, HandlerId, Link, LinkId, LinkMetricsUpdate, LinkSpec, Node, NodeId,
    NodeMetricsUpdate, NodeSpec, NodeStatus, Position, TopologyError, TopologyEvent,
    TopologyResult, TopologySnapshot,
};

use crate::bus::EventBus;
use crate::metrics::NetworkMetrics;

#[derive(Default)]
struct Registries {
    nodes: HashMap<NodeId, Node>,
    links: HashMap<LinkId, Link>,
    /// Link ids incident to each node; parallel links appear individually
    incident: HashMap<NodeId, Vec<LinkId>>,
}

impl Registries {
    /// True when at least one remaining link joins `a` and `b`
    fn still_linked(&self, a: &NodeId, b: &NodeId) -> bool {
        self.incident.get(a).is_some_and(|ids| {
            ids.iter()
                .filter_map(|lid| self.links.get(lid))
                .any(|link| link.connects(a, b))
        })
    }

    /// Remove `link` from both incidence lists and, when it was the last
    /// link between the pair, from both `connections` sets
    ///
    /// The link record itself must already be out of `links`.
    fn detach(&mut self, link: &Link) {
        for end in [&link.source, &link.target] {
            if let Some(ids) = self.incident.get_mut(end) {
                ids.retain(|lid| lid != &link.id);
            }
        }
        if !self.still_linked(&link.source, &link.target) {
            if let Some(node) = self.nodes.get_mut(&link.source) {
                node.connections.remove(&link.target);
            }
            if let Some(node) = self.nodes.get_mut(&link.target) {
                node.connections.remove(&link.source);
            }
        }
    }
}

/// Single source of truth for the mesh graph
///
/// Event handlers run synchronously on the mutating thread while the
/// mutation guard is held: they may query the store freely, but a handler
/// that calls a mutating operation will deadlock on the guard.
pub struct TopologyStore {
    registries: RwLock<Registries>,
    /// Serializes mutators and keeps event order equal to mutation order
    mutation: Mutex<()>,
    bus: EventBus,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self {
            registries: RwLock::new(Registries::default()),
            mutation: Mutex::new(()),
            bus: EventBus::new(),
        }
    }

    /// Register a node
    ///
    /// Emits `node_added` and `topology_changed`. Returns the stored record.
    pub fn add_node(&self, spec: NodeSpec) -> TopologyResult<Node> {
        let _mutation = self.mutation.lock().unwrap();
        let (node, nodes_total, links_total) = {
            let mut reg = self.registries.write().unwrap();
            if reg.nodes.contains_key(&spec.id) {
                return Err(TopologyError::NodeExists(spec.id));
            }
            let node = spec.into_node();
            reg.nodes.insert(node.id.clone(), node.clone());
            reg.incident.entry(node.id.clone()).or_default();
            (node, reg.nodes.len(), reg.links.len())
        };

        debug!(node = %node.id, kind = %node.kind, "node added");
        self.bus.dispatch(&TopologyEvent::node_added(node.clone()));
        self.bus
            .dispatch(&TopologyEvent::topology_changed(nodes_total, links_total));
        Ok(node)
    }

    /// Remove a node, cascading over every incident link first
    ///
    /// Emits `link_removed` per cascaded link (in link-id order), then
    /// `node_removed`, then one `topology_changed`. Returns the removed
    /// record with its links already detached.
    pub fn remove_node(&self, id: &NodeId) -> TopologyResult<Node> {
        let _mutation = self.mutation.lock().unwrap();
        let (node, removed_links, nodes_total, links_total) = {
            let mut reg = self.registries.write().unwrap();
            if !reg.nodes.contains_key(id) {
                return Err(TopologyError::NodeNotFound(id.clone()));
            }

            let mut incident: Vec<LinkId> = reg.incident.get(id).cloned().unwrap_or_default();
            incident.sort();

            let mut removed_links = Vec::with_capacity(incident.len());
            for lid in incident {
                if let Some(link) = reg.links.remove(&lid) {
                    reg.detach(&link);
                    removed_links.push(link);
                }
            }
            reg.incident.remove(id);

            // detach() already cleaned every neighbor's connection set, so
            // the record comes out with an empty `connections`
            let node = reg
                .nodes
                .remove(id)
                .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
            (node, removed_links, reg.nodes.len(), reg.links.len())
        };

        debug!(node = %id, cascaded = removed_links.len(), "node removed");
        for link in &removed_links {
            self.bus.dispatch(&TopologyEvent::link_removed(link.clone()));
        }
        self.bus.dispatch(&TopologyEvent::node_removed(node.clone()));
        self.bus
            .dispatch(&TopologyEvent::topology_changed(nodes_total, links_total));
        Ok(node)
    }

    /// Register a link after validating both endpoints
    ///
    /// Updates both endpoints' `connections`, emits `link_added` and
    /// `topology_changed`. Returns the stored record.
    pub fn add_link(&self, spec: LinkSpec) -> TopologyResult<Link> {
        let _mutation = self.mutation.lock().unwrap();
        let (link, nodes_total, links_total) = {
            let mut reg = self.registries.write().unwrap();
            if spec.source == spec.target {
                return Err(TopologyError::SelfLink(spec.id));
            }
            if reg.links.contains_key(&spec.id) {
                return Err(TopologyError::LinkExists(spec.id));
            }
            if !reg.nodes.contains_key(&spec.source) {
                return Err(TopologyError::UnknownEndpoint {
                    link: spec.id,
                    node: spec.source,
                });
            }
            if !reg.nodes.contains_key(&spec.target) {
                return Err(TopologyError::UnknownEndpoint {
                    link: spec.id,
                    node: spec.target,
                });
            }

            let link = spec.into_link();
            reg.incident
                .entry(link.source.clone())
                .or_default()
                .push(link.id.clone());
            reg.incident
                .entry(link.target.clone())
                .or_default()
                .push(link.id.clone());
            if let Some(node) = reg.nodes.get_mut(&link.source) {
                node.connections.insert(link.target.clone());
            }
            if let Some(node) = reg.nodes.get_mut(&link.target) {
                node.connections.insert(link.source.clone());
            }
            reg.links.insert(link.id.clone(), link.clone());
            (link, reg.nodes.len(), reg.links.len())
        };

        debug!(link = %link.id, source = %link.source, target = %link.target, "link added");
        self.bus.dispatch(&TopologyEvent::link_added(link.clone()));
        self.bus
            .dispatch(&TopologyEvent::topology_changed(nodes_total, links_total));
        Ok(link)
    }

    /// Remove a link, updating both endpoints' `connections`
    ///
    /// Emits `link_removed` and `topology_changed`. Returns the removed
    /// record. A second removal of the same id reports `LinkNotFound` and
    /// leaves the store untouched.
    pub fn remove_link(&self, id: &LinkId) -> TopologyResult<Link> {
        let _mutation = self.mutation.lock().unwrap();
        let (link, nodes_total, links_total) = {
            let mut reg = self.registries.write().unwrap();
            let link = reg
                .links
                .remove(id)
                .ok_or_else(|| TopologyError::LinkNotFound(id.clone()))?;
            reg.detach(&link);
            (link, reg.nodes.len(), reg.links.len())
        };

        debug!(link = %id, "link removed");
        self.bus.dispatch(&TopologyEvent::link_removed(link.clone()));
        self.bus
            .dispatch(&TopologyEvent::topology_changed(nodes_total, links_total));
        Ok(link)
    }

    /// Merge a partial metrics update into a node and bump `last_seen`
    ///
    /// Emits `node_updated`. Unknown ids report `NodeNotFound` and change
    /// nothing.
    pub fn update_node_metrics(
        &self,
        id: &NodeId,
        update: NodeMetricsUpdate,
    ) -> TopologyResult<()> {
        let _mutation = self.mutation.lock().unwrap();
        let node = {
            let mut reg = self.registries.write().unwrap();
            let node = reg
                .nodes
                .get_mut(id)
                .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
            update.apply_to(&mut node.metrics);
            node.last_seen = Utc::now();
            node.clone()
        };

        debug!(node = %id, "node metrics updated");
        self.bus.dispatch(&TopologyEvent::node_updated(node));
        Ok(())
    }

    /// Merge a partial telemetry update into a link and bump `last_seen`
    ///
    /// Emits `link_updated`.
    pub fn update_link_metrics(
        &self,
        id: &LinkId,
        update: LinkMetricsUpdate,
    ) -> TopologyResult<()> {
        let _mutation = self.mutation.lock().unwrap();
        let link = {
            let mut reg = self.registries.write().unwrap();
            let link = reg
                .links
                .get_mut(id)
                .ok_or_else(|| TopologyError::LinkNotFound(id.clone()))?;
            update.apply_to(link);
            link.last_seen = Utc::now();
            link.clone()
        };

        debug!(link = %id, "link metrics updated");
        self.bus.dispatch(&TopologyEvent::link_updated(link));
        Ok(())
    }

    /// Set a node's status, bumping `last_seen` whether or not it changed
    ///
    /// Emits `node_updated` only on an actual change. Returns whether the
    /// status changed.
    pub fn transition_status(&self, id: &NodeId, status: NodeStatus) -> TopologyResult<bool> {
        let _mutation = self.mutation.lock().unwrap();
        let (node, changed) = {
            let mut reg = self.registries.write().unwrap();
            let node = reg
                .nodes
                .get_mut(id)
                .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
            let changed = node.status != status;
            node.status = status;
            node.last_seen = Utc::now();
            (node.clone(), changed)
        };

        if changed {
            debug!(node = %id, status = %node.status, "status transition");
            self.bus.dispatch(&TopologyEvent::node_updated(node));
        }
        Ok(changed)
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.registries.read().unwrap().nodes.get(id).cloned()
    }

    pub fn link(&self, id: &LinkId) -> Option<Link> {
        self.registries.read().unwrap().links.get(id).cloned()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.registries.read().unwrap().nodes.contains_key(id)
    }

    pub fn contains_link(&self, id: &LinkId) -> bool {
        self.registries.read().unwrap().links.contains_key(id)
    }

    /// All nodes, sorted by id
    pub fn nodes(&self) -> Vec<Node> {
        let reg = self.registries.read().unwrap();
        let mut nodes: Vec<Node> = reg.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All links, sorted by id
    pub fn links(&self) -> Vec<Link> {
        let reg = self.registries.read().unwrap();
        let mut links: Vec<Link> = reg.links.values().cloned().collect();
        links.sort_by(|a, b| a.id.cmp(&b.id));
        links
    }

    pub fn node_count(&self) -> usize {
        self.registries.read().unwrap().nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.registries.read().unwrap().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.read().unwrap().nodes.is_empty()
    }

    /// Neighbor ids of a node, sorted; empty when the id is unknown
    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        self.registries
            .read()
            .unwrap()
            .nodes
            .get(id)
            .map(|node| node.connections.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The earliest-registered link joining `a` and `b`, in either
    /// orientation; O(degree of `a`)
    pub fn find_link_between(&self, a: &NodeId, b: &NodeId) -> Option<Link> {
        let reg = self.registries.read().unwrap();
        reg.incident.get(a).and_then(|ids| {
            ids.iter()
                .filter_map(|lid| reg.links.get(lid))
                .find(|link| link.connects(a, b))
                .cloned()
        })
    }

    /// Nodes within `radius` of `origin`, nearest first
    ///
    /// Uses the position-kind distance (Euclidean or great-circle km);
    /// nodes whose position kind differs from `origin` never match.
    pub fn nodes_in_range(&self, origin: &Position, radius: f64) -> Vec<Node> {
        let reg = self.registries.read().unwrap();
        let mut hits: Vec<(f64, Node)> = reg
            .nodes
            .values()
            .filter_map(|node| {
                node.position
                    .distance_to(origin)
                    .filter(|d| *d <= radius)
                    .map(|d| (d, node.clone()))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        hits.into_iter().map(|(_, node)| node).collect()
    }

    /// Immutable capture of the whole topology, sorted by id
    pub fn snapshot(&self) -> TopologySnapshot {
        let reg = self.registries.read().unwrap();
        TopologySnapshot::new(
            reg.nodes.values().cloned().collect(),
            reg.links.values().cloned().collect(),
        )
    }

    /// Aggregate metrics over the current state
    pub fn network_metrics(&self) -> NetworkMetrics {
        let reg = self.registries.read().unwrap();
        NetworkMetrics::compute(reg.nodes.values(), reg.links.values())
    }

    /// Register an event handler for `kind`
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&TopologyEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    /// Drop a previously registered handler
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        self.bus.unsubscribe(id)
    }
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use meridian_core::{LinkKind, LinkStatus, NodeKind};

    use super::*;

    fn local_node(id: &str) -> NodeSpec {
        NodeSpec::new(id, NodeKind::Relay, Position::local(0.0, 0.0, 0.0))
    }

    fn wifi_link(id: &str, a: &str, b: &str) -> LinkSpec {
        LinkSpec::new(a, b, LinkKind::Wifi).with_id(id)
    }

    /// Recompute every node's expected connection set from the link
    /// registry and compare
    fn assert_connections_invariant(store: &TopologyStore) {
        let snapshot = store.snapshot();
        let mut expected: HashMap<NodeId, BTreeSet<NodeId>> = snapshot
            .nodes
            .iter()
            .map(|n| (n.id.clone(), BTreeSet::new()))
            .collect();

        for link in &snapshot.links {
            assert!(
                expected.contains_key(&link.source) && expected.contains_key(&link.target),
                "link {} references a missing node",
                link.id
            );
            expected
                .get_mut(&link.source)
                .unwrap()
                .insert(link.target.clone());
            expected
                .get_mut(&link.target)
                .unwrap()
                .insert(link.source.clone());
        }

        for node in &snapshot.nodes {
            assert_eq!(
                node.connections, expected[&node.id],
                "connections of {} out of sync",
                node.id
            );
        }
    }

    fn chain_store() -> TopologyStore {
        let store = TopologyStore::new();
        for id in ["a", "b", "c"] {
            store.add_node(local_node(id)).unwrap();
        }
        store.add_link(wifi_link("ab", "a", "b")).unwrap();
        store.add_link(wifi_link("bc", "b", "c")).unwrap();
        store
    }

    #[test]
    fn test_add_and_get_node() {
        let store = TopologyStore::new();
        let node = store.add_node(local_node("a").with_name("Alpha")).unwrap();
        assert_eq!(node.name, "Alpha");

        let fetched = store.node(&NodeId::from("a")).unwrap();
        assert_eq!(fetched.id.as_str(), "a");
        assert!(store.contains_node(&NodeId::from("a")));
        assert_eq!(store.node_count(), 1);
        assert!(store.node(&NodeId::from("ghost")).is_none());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let store = TopologyStore::new();
        store.add_node(local_node("a")).unwrap();
        let err = store.add_node(local_node("a")).unwrap_err();
        assert!(matches!(err, TopologyError::NodeExists(_)));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_add_link_requires_known_endpoints() {
        let store = TopologyStore::new();
        store.add_node(local_node("a")).unwrap();

        let err = store.add_link(wifi_link("ab", "a", "ghost")).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownEndpoint { .. }));
        assert_eq!(store.link_count(), 0);
        // the failed insert must not leave a half-registered link behind
        assert!(store.neighbors(&NodeId::from("a")).is_empty());
    }

    #[test]
    fn test_self_link_rejected() {
        let store = TopologyStore::new();
        store.add_node(local_node("a")).unwrap();
        let err = store.add_link(wifi_link("aa", "a", "a")).unwrap_err();
        assert!(matches!(err, TopologyError::SelfLink(_)));
    }

    #[test]
    fn test_duplicate_link_id_rejected() {
        let store = chain_store();
        let err = store.add_link(wifi_link("ab", "a", "c")).unwrap_err();
        assert!(matches!(err, TopologyError::LinkExists(_)));
        assert_eq!(store.link_count(), 2);
    }

    #[test]
    fn test_link_updates_connections_bidirectionally() {
        let store = chain_store();
        assert_eq!(
            store.neighbors(&NodeId::from("b")),
            vec![NodeId::from("a"), NodeId::from("c")]
        );
        assert_eq!(store.neighbors(&NodeId::from("a")), vec![NodeId::from("b")]);
        assert_connections_invariant(&store);
    }

    #[test]
    fn test_remove_link_cleans_connections() {
        let store = chain_store();
        let removed = store.remove_link(&LinkId::from("bc")).unwrap();
        assert_eq!(removed.id.as_str(), "bc");

        assert!(store.neighbors(&NodeId::from("c")).is_empty());
        assert_eq!(store.neighbors(&NodeId::from("b")), vec![NodeId::from("a")]);
        assert_connections_invariant(&store);
    }

    #[test]
    fn test_remove_link_twice_is_not_found() {
        let store = chain_store();
        store.remove_link(&LinkId::from("bc")).unwrap();
        let err = store.remove_link(&LinkId::from("bc")).unwrap_err();
        assert!(matches!(err, TopologyError::LinkNotFound(_)));
        assert_eq!(store.link_count(), 1);
    }

    #[test]
    fn test_parallel_links_keep_connection_until_last() {
        let store = TopologyStore::new();
        store.add_node(local_node("a")).unwrap();
        store.add_node(local_node("b")).unwrap();
        store.add_link(wifi_link("l1", "a", "b")).unwrap();
        store.add_link(wifi_link("l2", "a", "b")).unwrap();

        store.remove_link(&LinkId::from("l1")).unwrap();
        // one parallel link remains, so the neighbor entry stays
        assert_eq!(store.neighbors(&NodeId::from("a")), vec![NodeId::from("b")]);

        store.remove_link(&LinkId::from("l2")).unwrap();
        assert!(store.neighbors(&NodeId::from("a")).is_empty());
        assert_connections_invariant(&store);
    }

    #[test]
    fn test_remove_node_cascades() {
        let store = chain_store();
        let removed = store.remove_node(&NodeId::from("b")).unwrap();

        assert!(removed.connections.is_empty());
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.link_count(), 0);
        assert!(store.neighbors(&NodeId::from("a")).is_empty());
        assert!(store.neighbors(&NodeId::from("c")).is_empty());
        assert_connections_invariant(&store);

        let err = store.remove_node(&NodeId::from("b")).unwrap_err();
        assert!(matches!(err, TopologyError::NodeNotFound(_)));
    }

    #[test]
    fn test_update_node_metrics_merges_and_bumps_last_seen() {
        let store = chain_store();
        let before = store.node(&NodeId::from("a")).unwrap().last_seen;

        store
            .update_node_metrics(
                &NodeId::from("a"),
                NodeMetricsUpdate::new()
                    .with_latency_ms(42.0)
                    .with_packet_loss_pct(2.5),
            )
            .unwrap();

        let node = store.node(&NodeId::from("a")).unwrap();
        assert_eq!(node.metrics.latency_ms, 42.0);
        assert_eq!(node.metrics.packet_loss_pct, 2.5);
        assert_eq!(node.metrics.uptime_pct, 100.0);
        assert!(node.last_seen >= before);

        let err = store
            .update_node_metrics(&NodeId::from("ghost"), NodeMetricsUpdate::new())
            .unwrap_err();
        assert!(matches!(err, TopologyError::NodeNotFound(_)));
    }

    #[test]
    fn test_update_link_metrics_merges() {
        let store = chain_store();
        store
            .update_link_metrics(
                &LinkId::from("ab"),
                LinkMetricsUpdate::new()
                    .with_latency_ms(15.0)
                    .with_status(LinkStatus::Congested)
                    .with_packets(100),
            )
            .unwrap();

        let link = store.link(&LinkId::from("ab")).unwrap();
        assert_eq!(link.latency_ms, 15.0);
        assert_eq!(link.status, LinkStatus::Congested);
        assert_eq!(link.packets, 100);

        let err = store
            .update_link_metrics(&LinkId::from("ghost"), LinkMetricsUpdate::new())
            .unwrap_err();
        assert!(matches!(err, TopologyError::LinkNotFound(_)));
    }

    #[test]
    fn test_transition_status_reports_change() {
        let store = chain_store();
        let id = NodeId::from("a");

        assert!(store.transition_status(&id, NodeStatus::Degraded).unwrap());
        assert!(!store.transition_status(&id, NodeStatus::Degraded).unwrap());
        assert_eq!(store.node(&id).unwrap().status, NodeStatus::Degraded);

        let updated = Arc::new(AtomicUsize::new(0));
        let u = Arc::clone(&updated);
        store.subscribe(EventKind::NodeUpdated, move |_| {
            u.fetch_add(1, Ordering::SeqCst);
        });

        // same status again: last_seen bumps, but no event
        store.transition_status(&id, NodeStatus::Degraded).unwrap();
        assert_eq!(updated.load(Ordering::SeqCst), 0);

        store.transition_status(&id, NodeStatus::Online).unwrap();
        assert_eq!(updated.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_find_link_between_both_orientations() {
        let store = chain_store();
        let ab = NodeId::from("a");
        let b = NodeId::from("b");

        assert_eq!(store.find_link_between(&ab, &b).unwrap().id.as_str(), "ab");
        assert_eq!(store.find_link_between(&b, &ab).unwrap().id.as_str(), "ab");
        assert!(
            store
                .find_link_between(&ab, &NodeId::from("c"))
                .is_none()
        );
    }

    #[test]
    fn test_nodes_in_range_sorted_nearest_first() {
        let store = TopologyStore::new();
        store
            .add_node(NodeSpec::new(
                "near",
                NodeKind::Relay,
                Position::local(1.0, 0.0, 0.0),
            ))
            .unwrap();
        store
            .add_node(NodeSpec::new(
                "far",
                NodeKind::Relay,
                Position::local(5.0, 0.0, 0.0),
            ))
            .unwrap();
        store
            .add_node(NodeSpec::new(
                "outside",
                NodeKind::Relay,
                Position::local(50.0, 0.0, 0.0),
            ))
            .unwrap();
        // geographic node never matches a local origin
        store
            .add_node(NodeSpec::new(
                "geo",
                NodeKind::Gateway,
                Position::geographic(48.0, 11.0, 0.0),
            ))
            .unwrap();

        let origin = Position::local(0.0, 0.0, 0.0);
        let hits = store.nodes_in_range(&origin, 10.0);
        let ids: Vec<&str> = hits.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[test]
    fn test_snapshot_and_network_metrics() {
        let store = chain_store();
        store
            .transition_status(&NodeId::from("c"), NodeStatus::Offline)
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.node_count(), 3);
        assert_eq!(snapshot.link_count(), 2);
        assert_eq!(snapshot.nodes[0].id.as_str(), "a");

        let metrics = store.network_metrics();
        assert_eq!(metrics.total_nodes, 3);
        assert_eq!(metrics.active_nodes, 2);
        assert_eq!(metrics.active_links, 2);
        assert!((metrics.coverage_pct - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_node_event_order() {
        let store = chain_store();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        for kind in [
            EventKind::LinkRemoved,
            EventKind::NodeRemoved,
            EventKind::TopologyChanged,
        ] {
            let seen = Arc::clone(&seen);
            store.subscribe(kind, move |event| {
                seen.lock().unwrap().push(event.kind());
            });
        }

        store.remove_node(&NodeId::from("b")).unwrap();

        let events = seen.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                EventKind::LinkRemoved,
                EventKind::LinkRemoved,
                EventKind::NodeRemoved,
                EventKind::TopologyChanged,
            ]
        );
    }

    #[test]
    fn test_metric_update_emits_no_topology_changed() {
        let store = chain_store();
        let structural = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&structural);
        store.subscribe(EventKind::TopologyChanged, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        store
            .update_node_metrics(
                &NodeId::from("a"),
                NodeMetricsUpdate::new().with_latency_ms(10.0),
            )
            .unwrap();
        store
            .update_link_metrics(
                &LinkId::from("ab"),
                LinkMetricsUpdate::new().with_latency_ms(3.0),
            )
            .unwrap();

        assert_eq!(structural.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handlers_observe_settled_state() {
        let store = Arc::new(TopologyStore::new());
        let observed = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&store);
        let seen = Arc::clone(&observed);
        store.subscribe(EventKind::NodeAdded, move |event| {
            if let TopologyEvent::NodeAdded { node, .. } = event {
                // queries from inside a handler see the mutation applied
                if inner.contains_node(&node.id) {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        store.add_node(local_node("a")).unwrap();
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_handler_does_not_fail_mutation() {
        let store = TopologyStore::new();
        let later = Arc::new(AtomicUsize::new(0));

        store.subscribe(EventKind::NodeAdded, |_| panic!("subscriber bug"));
        let l = Arc::clone(&later);
        store.subscribe(EventKind::NodeAdded, move |_| {
            l.fetch_add(1, Ordering::SeqCst);
        });

        let result = store.add_node(local_node("a"));
        assert!(result.is_ok());
        assert_eq!(later.load(Ordering::SeqCst), 1);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_events_carry_topology_counts() {
        let store = TopologyStore::new();
        let counts = Arc::new(std::sync::Mutex::new(Vec::new()));

        let c = Arc::clone(&counts);
        store.subscribe(EventKind::TopologyChanged, move |event| {
            if let TopologyEvent::TopologyChanged { nodes, links, .. } = event {
                c.lock().unwrap().push((*nodes, *links));
            }
        });

        store.add_node(local_node("a")).unwrap();
        store.add_node(local_node("b")).unwrap();
        store.add_link(wifi_link("ab", "a", "b")).unwrap();
        store.remove_node(&NodeId::from("a")).unwrap();

        assert_eq!(
            *counts.lock().unwrap(),
            vec![(1, 0), (2, 0), (2, 1), (1, 0)]
        );
    }

    #[test]
    fn test_unsubscribe_via_store() {
        let store = TopologyStore::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let id = store.subscribe(EventKind::NodeAdded, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        store.add_node(local_node("a")).unwrap();
        assert!(store.unsubscribe(id));
        store.add_node(local_node("b")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
