//! Per-pass counters, in the shape of the backend's polling info.

use meshmap_model::{Edge, Node, NodeRole, Protocol};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts gathered over one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyStats {
    /// Raw records in the snapshot.
    pub records: usize,
    /// Distinct polled nodes (including the local node).
    pub polled_nodes: usize,
    pub ghost_nodes: usize,
    /// Polled nodes per band key.
    pub nodes_by_band: BTreeMap<String, usize>,
    /// Records dropped for lacking a mappable location.
    pub no_location: usize,
    /// Records folded into an earlier record of the same hostname.
    pub duplicate_records: usize,
    pub edges: usize,
    pub rf_edges: usize,
    pub dangling_edges: usize,
    pub issues: usize,
    pub babel_nodes: usize,
    pub olsr_nodes: usize,
    pub combo_nodes: usize,
    pub unknown_protocol_nodes: usize,
}

impl TopologyStats {
    /// Count the merged node set and edges. Fields that depend on dropped
    /// records are left for the caller.
    pub fn count(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut stats = TopologyStats::default();

        for node in nodes {
            if node.role == NodeRole::Ghost {
                stats.ghost_nodes += 1;
                continue;
            }
            stats.polled_nodes += 1;
            if let Some(band) = &node.band {
                *stats.nodes_by_band.entry(band.key().to_string()).or_default() += 1;
            }
            let protocol = node
                .telemetry
                .as_ref()
                .map(|t| t.protocol)
                .unwrap_or_default();
            match protocol {
                Protocol::BabelOnly => stats.babel_nodes += 1,
                Protocol::OlsrOnly => stats.olsr_nodes += 1,
                Protocol::Combo => stats.combo_nodes += 1,
                Protocol::Unknown => stats.unknown_protocol_nodes += 1,
            }
        }

        stats.edges = edges.len();
        stats.rf_edges = edges.iter().filter(|e| e.link_type.is_rf()).count();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmap_model::{Band, GeoPoint, Telemetry};

    fn node(name: &str, band: Band, protocol: Protocol) -> Node {
        Node {
            hostname: name.to_string(),
            band: Some(band),
            role: NodeRole::Polled,
            position: GeoPoint::new(34.0, -118.0).unwrap(),
            telemetry: Some(Telemetry {
                protocol,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_count_nodes() {
        let nodes = vec![
            node("a", Band::Ghz5, Protocol::Combo),
            node("b", Band::Ghz5, Protocol::OlsrOnly),
            node("c", Band::NoRf, Protocol::BabelOnly),
            Node::ghost("d", GeoPoint::new(34.5, -118.5).unwrap()),
        ];
        let stats = TopologyStats::count(&nodes, &[]);

        assert_eq!(stats.polled_nodes, 3);
        assert_eq!(stats.ghost_nodes, 1);
        assert_eq!(stats.nodes_by_band.get("5ghz"), Some(&2));
        assert_eq!(stats.nodes_by_band.get("noRF"), Some(&1));
        assert_eq!(stats.combo_nodes, 1);
        assert_eq!(stats.olsr_nodes, 1);
        assert_eq!(stats.babel_nodes, 1);
        assert_eq!(stats.unknown_protocol_nodes, 0);
        assert_eq!(stats.edges, 0);
    }
}
