//! One aggregation pass over a snapshot.

use crate::aggregate::aggregate;
use crate::classify::classify;
use crate::config::TopologyConfig;
use crate::geo::backfill_distance;
use crate::ghost::{resolve_ghosts, DanglingEdge};
use crate::project::edge_labels;
use crate::protocol::ProtocolCutoffs;
use crate::services::{format_services, ServiceLinks};
use crate::snapshot::Snapshot;
use crate::stats::TopologyStats;
use chrono::{DateTime, Utc};
use meshmap_metrics::metric_defs;
use meshmap_model::{DistanceUnits, Edge, Issue, MetricKey, Node, NodeRole};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The result of one pass: merged nodes, edges and everything noticed on
/// the way. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    /// Metric the edge `metric` labels were rendered for.
    pub metric: MetricKey,
    pub units: DistanceUnits,
    /// Polled nodes in first-seen order, then ghosts in discovery order.
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub dangling: Vec<DanglingEdge>,
    pub issues: Vec<Issue>,
    pub stats: TopologyStats,
}

impl Topology {
    /// Find a node by hostname, ignoring case and the mesh domain suffix.
    pub fn node(&self, hostname: &str, config: &TopologyConfig) -> Option<&Node> {
        let key = config.key(hostname);
        self.nodes.iter().find(|n| config.key(&n.hostname) == key)
    }

    pub fn local_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.role == NodeRole::Local)
    }

    pub fn ghosts(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_ghost())
    }

    /// Edges reported by `hostname`.
    pub fn edges_from<'a>(
        &'a self,
        hostname: &str,
        config: &'a TopologyConfig,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        let key = config.key(hostname);
        self.edges
            .iter()
            .filter(move |e| config.key(&e.source) == key)
    }

    /// Formatted services for a node, or `None` if no such node was polled.
    pub fn services(&self, hostname: &str, config: &TopologyConfig) -> Option<ServiceLinks> {
        let telemetry = self.node(hostname, config)?.telemetry.as_ref()?;
        Some(format_services(&telemetry.services, &config.local_domain))
    }
}

/// Run one aggregation pass.
///
/// Classify → aggregate → resolve ghosts → project. Nothing in the snapshot
/// can make this fail; problems end up in [`Topology::issues`].
pub fn build_topology(snapshot: &Snapshot, config: &TopologyConfig) -> Topology {
    let started = Instant::now();
    let mut issues = Vec::new();

    let classification = classify(snapshot, config, &mut issues);
    let mut edges = aggregate(&classification.nodes, config);
    let mut nodes: Vec<Node> = classification.nodes.into_iter().map(|p| p.node).collect();

    let cutoffs = ProtocolCutoffs::from_config(&config.protocol);
    let now = reference_time(&nodes, config);
    for node in &mut nodes {
        if let Some(telemetry) = node.telemetry.as_mut() {
            telemetry.protocol = cutoffs.detect_telemetry(telemetry, now);
        }
    }

    let dangling = resolve_ghosts(&mut nodes, &mut edges, config);

    let mut backfilled = 0;
    for edge in &mut edges {
        if backfill_distance(edge) {
            backfilled += 1;
        }
        edge.labels = edge_labels(edge, config.metric, config.units);
    }
    if backfilled > 0 {
        debug!(edges = backfilled, "computed missing RF distances");
    }

    let mut stats = TopologyStats::count(&nodes, &edges);
    stats.records = snapshot.record_count();
    stats.no_location = classification.dropped_no_location;
    stats.duplicate_records = classification.duplicates;
    stats.dangling_edges = dangling.len();
    stats.issues = issues.len();

    let topology = Topology {
        metric: config.metric,
        units: config.units,
        nodes,
        edges,
        dangling,
        issues,
        stats,
    };

    let elapsed = started.elapsed();
    record_metrics(&topology, elapsed);
    info!(
        nodes = topology.stats.polled_nodes,
        ghosts = topology.stats.ghost_nodes,
        edges = topology.stats.edges,
        dangling = topology.stats.dangling_edges,
        issues = topology.stats.issues,
        elapsed_us = elapsed.as_micros() as u64,
        "topology built"
    );
    topology
}

/// The configured reference time, else the newest `last_seen` in the pass.
fn reference_time(nodes: &[Node], config: &TopologyConfig) -> DateTime<Utc> {
    config
        .reference_time
        .or_else(|| {
            nodes
                .iter()
                .filter_map(|n| n.telemetry.as_ref()?.last_seen)
                .max()
        })
        .unwrap_or_else(Utc::now)
}

fn record_metrics(topology: &Topology, elapsed: Duration) {
    for role in [NodeRole::Polled, NodeRole::Local, NodeRole::Ghost] {
        let count = topology.nodes.iter().filter(|n| n.role == role).count();
        let labels = [("role", role.as_str().to_string())];
        metrics::gauge!(metric_defs::TOPOLOGY_NODES.name, &labels).set(count as f64);
    }

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for edge in &topology.edges {
        *by_type.entry(edge.link_type.as_str()).or_default() += 1;
    }
    for (link_type, count) in by_type {
        let labels = [("link_type", link_type.to_string())];
        metrics::gauge!(metric_defs::TOPOLOGY_EDGES.name, &labels).set(count as f64);
    }

    metrics::gauge!(metric_defs::TOPOLOGY_GHOSTS.name).set(topology.stats.ghost_nodes as f64);
    metrics::gauge!(metric_defs::TOPOLOGY_DANGLING_EDGES.name)
        .set(topology.stats.dangling_edges as f64);

    for issue in &topology.issues {
        let labels = [("kind", issue.kind.as_str().to_string())];
        metrics::counter!(metric_defs::TOPOLOGY_ISSUES.name, &labels).increment(1);
    }

    metrics::counter!(metric_defs::TOPOLOGY_PASSES.name).increment(1);
    metrics::histogram!(metric_defs::TOPOLOGY_BUILD_TIME.name).record(elapsed.as_micros() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use meshmap_model::{Protocol, ProtocolConfig};
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::from_value(json!({
            "5ghz": [{
                "node": "alpha", "lat": 34.0, "lon": -118.0,
                "firmware_version": "3.25.6.0",
                "last_seen": "2025-06-01 12:00:00",
                "services": [{"name": "Map", "link": "http://map"}],
                "link_info": {
                    "10.0.0.2": {"hostname": "bravo", "linkType": "RF", "linkLat": 35.0, "linkLon": -118.0},
                    "10.0.0.3": {"hostname": "charlie", "linkType": "DTD"}
                }
            }],
            "2ghz": [{
                "node": "charlie", "lat": 34.01, "lon": -118.01,
                "firmware_version": "3.24.10.0",
                "last_seen": "2025-05-01 12:00:00"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_topology() {
        let topology = build_topology(&snapshot(), &TopologyConfig::default());

        let names: Vec<&str> = topology.nodes.iter().map(|n| n.hostname.as_str()).collect();
        assert_eq!(names, vec!["alpha", "charlie", "bravo"]);
        assert!(topology.nodes[2].is_ghost());
        assert_eq!(topology.edges.len(), 2);
        assert!(topology.dangling.is_empty());

        let rf = &topology.edges[0];
        assert!(rf.metrics.distance_km.is_some());
        assert_eq!(rf.metrics.bearing, Some(0.0));
        assert_eq!(rf.labels.summary, "bravo (RF) 69.09 mi (111.19 km)");
        assert_eq!(rf.labels.metric, "69.09 mi (111.19 km)");

        let dtd = &topology.edges[1];
        assert_eq!(dtd.to, Some(topology.nodes[1].position));
        assert_eq!(dtd.labels.summary, "charlie (DTD)");

        assert_eq!(topology.stats.records, 2);
        assert_eq!(topology.stats.polled_nodes, 2);
        assert_eq!(topology.stats.ghost_nodes, 1);
        assert_eq!(topology.stats.rf_edges, 1);
    }

    #[test]
    fn test_protocol_uses_newest_last_seen() {
        let topology = build_topology(&snapshot(), &TopologyConfig::default());
        let protocol = |i: usize| topology.nodes[i].telemetry.as_ref().unwrap().protocol;
        assert_eq!(protocol(0), Protocol::Combo);
        // Last seen a month before the newest record.
        assert_eq!(protocol(1), Protocol::Unknown);
        assert_eq!(topology.stats.combo_nodes, 1);
        assert_eq!(topology.stats.unknown_protocol_nodes, 1);
    }

    #[test]
    fn test_explicit_reference_time() {
        let config = TopologyConfig {
            reference_time: Some(Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let topology = build_topology(&snapshot(), &config);
        let charlie = topology.node("CHARLIE.local.mesh", &config).unwrap();
        assert_eq!(charlie.telemetry.as_ref().unwrap().protocol, Protocol::OlsrOnly);
    }

    #[test]
    fn test_oversized_freshness_threshold_does_not_abort() {
        let config = TopologyConfig {
            protocol: ProtocolConfig {
                threshold_secs: 1_000_000_000_000_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let topology = build_topology(&snapshot(), &config);
        let charlie = topology.node("charlie", &config).unwrap();
        assert_eq!(charlie.telemetry.as_ref().unwrap().protocol, Protocol::OlsrOnly);
    }

    #[test]
    fn test_metric_selection_and_units() {
        let config = TopologyConfig {
            metric: MetricKey::Snr,
            units: DistanceUnits::Kilometers,
            ..Default::default()
        };
        let topology = build_topology(&snapshot(), &config);
        assert_eq!(topology.metric, MetricKey::Snr);
        assert_eq!(topology.edges[0].labels.metric, "Unknown");
        assert_eq!(topology.edges[0].labels.summary, "bravo (RF) 111.19 km (69.09 mi)");
    }

    #[test]
    fn test_services_lookup() {
        let config = TopologyConfig::default();
        let topology = build_topology(&snapshot(), &config);
        let services = topology.services("Alpha", &config).unwrap();
        assert_eq!(services.links()[0].link, "http://map.local.mesh");
        assert_eq!(topology.services("charlie", &config), Some(ServiceLinks::NoServices));
        // Ghosts carry no telemetry.
        assert_eq!(topology.services("bravo", &config), None);
        assert_eq!(topology.services("zulu", &config), None);
    }

    #[test]
    fn test_edges_from() {
        let config = TopologyConfig::default();
        let topology = build_topology(&snapshot(), &config);
        assert_eq!(topology.edges_from("ALPHA", &config).count(), 2);
        assert_eq!(topology.edges_from("charlie", &config).count(), 0);
    }
}
