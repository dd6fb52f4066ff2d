//! Property tests over generated snapshots.

use meshmap_topology::{build_topology, Snapshot, TopologyConfig};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

// ============================================================================
// Generators
// ============================================================================

/// Hostnames chosen to collide under case folding and suffix stripping.
const HOSTNAMES: &[&str] = &[
    "alpha",
    "Alpha",
    "BRAVO",
    "bravo.local.mesh",
    "charlie",
    "delta",
    "echo",
];

const BANDS: &[&str] = &["900", "2ghz", "5ghz", "noRF", "supernode", "60ghz"];

fn hostname() -> impl Strategy<Value = String> {
    prop::sample::select(HOSTNAMES).prop_map(str::to_string)
}

fn coordinate() -> impl Strategy<Value = Option<(f64, f64)>> {
    prop::option::of((30.0f64..40.0, -125.0f64..-115.0))
}

fn link() -> impl Strategy<Value = (u8, Option<String>, bool, Option<(f64, f64)>)> {
    (1u8..6, prop::option::of(hostname()), any::<bool>(), coordinate())
}

fn record() -> impl Strategy<Value = (String, Option<(f64, f64)>, Vec<(u8, Option<String>, bool, Option<(f64, f64)>)>)> {
    (hostname(), coordinate(), prop::collection::vec(link(), 0..5))
}

fn snapshot() -> impl Strategy<Value = Value> {
    prop::collection::vec((prop::sample::select(BANDS), record()), 0..10).prop_map(|records| {
        let mut bands = Map::new();
        for (band, (node, position, links)) in records {
            let mut link_info = Map::new();
            for (octet, neighbor, rf, at) in links {
                let mut entry = json!({"linkType": if rf { "RF" } else { "DTD" }});
                if let Some(name) = neighbor {
                    entry["hostname"] = json!(name);
                }
                if let Some((lat, lon)) = at {
                    entry["linkLat"] = json!(lat);
                    entry["linkLon"] = json!(lon);
                }
                link_info.insert(format!("10.0.0.{}", octet), entry);
            }
            let mut raw = json!({"node": node, "link_info": link_info});
            if let Some((lat, lon)) = position {
                raw["lat"] = json!(lat);
                raw["lon"] = json!(lon);
            }
            if let Value::Array(list) = bands
                .entry(band.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                list.push(raw);
            }
        }
        Value::Object(bands)
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn hostnames_are_unique(document in snapshot()) {
        let config = TopologyConfig::default();
        let topology = build_topology(&Snapshot::from_value(document).unwrap(), &config);

        let mut seen = HashSet::new();
        for node in &topology.nodes {
            prop_assert!(seen.insert(config.key(&node.hostname)), "duplicate {}", node.hostname);
        }
    }

    #[test]
    fn edge_endpoints_resolve(document in snapshot()) {
        let config = TopologyConfig::default();
        let topology = build_topology(&Snapshot::from_value(document).unwrap(), &config);

        let keys: HashSet<String> = topology.nodes.iter().map(|n| config.key(&n.hostname)).collect();
        let dangling: HashSet<(String, String)> = topology
            .dangling
            .iter()
            .map(|d| (d.source.clone(), d.neighbor_ip.clone()))
            .collect();

        for edge in &topology.edges {
            prop_assert!(keys.contains(&config.key(&edge.source)));
            if keys.contains(&config.key(&edge.destination)) {
                prop_assert!(edge.to.is_some());
            } else {
                prop_assert!(edge.to.is_none());
                prop_assert!(dangling.contains(&(edge.source.clone(), edge.neighbor_ip.clone())));
            }
        }
    }

    #[test]
    fn one_edge_per_source_and_neighbor(document in snapshot()) {
        let config = TopologyConfig::default();
        let topology = build_topology(&Snapshot::from_value(document).unwrap(), &config);

        let mut pairs = HashSet::new();
        for edge in &topology.edges {
            prop_assert!(pairs.insert((config.key(&edge.source), edge.neighbor_ip.clone())));
        }
    }

    #[test]
    fn rebuilding_is_byte_identical(document in snapshot()) {
        let config = TopologyConfig::default();
        let snapshot = Snapshot::from_value(document).unwrap();
        let first = serde_json::to_string(&build_topology(&snapshot, &config)).unwrap();
        let second = serde_json::to_string(&build_topology(&snapshot, &config)).unwrap();
        prop_assert_eq!(first, second);
    }
}
