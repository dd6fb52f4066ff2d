//! Node classification.
//!
//! Flattens the band document into one node set tagged with band and role,
//! and regroups flat node reports into a band document.

use crate::config::TopologyConfig;
use crate::snapshot::Snapshot;
use meshmap_model::value::FieldReader;
use meshmap_model::{
    normalize_node, Band, Issue, IssueKind, LinkRecord, Node, NodeRole, BAND_TABLE,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// A polled node together with its link table.
#[derive(Debug, Clone, PartialEq)]
pub struct PolledNode {
    pub node: Node,
    /// Link table entries from every record of this node, in document order.
    pub links: Vec<LinkRecord>,
}

/// Output of [`classify`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// One entry per distinct hostname, in first-seen order.
    pub nodes: Vec<PolledNode>,
    /// Records dropped because they had no mappable location.
    pub dropped_no_location: usize,
    /// Records that repeated a hostname already seen.
    pub duplicates: usize,
}

/// Classify every record of a snapshot.
///
/// Bands are walked in document order. A hostname seen more than once keeps a
/// single node in its first-seen slot: the later record replaces band,
/// coordinates and telemetry, and link tables are concatenated so the
/// aggregator can apply last-write-wins per neighbor.
pub fn classify(
    snapshot: &Snapshot,
    config: &TopologyConfig,
    issues: &mut Vec<Issue>,
) -> Classification {
    let mut result = Classification::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (key, records) in snapshot.bands() {
        let band = Band::from_key(key);
        if !band.is_classified() {
            warn!(band = %key, "unknown band, keeping its nodes unclassified");
            issues.push(Issue::unknown_band(key));
        }

        let records = match records {
            Value::Array(records) => records,
            Value::Null => continue,
            other => {
                debug!(band = %key, "band value is not a list, skipping");
                issues.push(Issue::malformed(key, "*", "nodes", other));
                continue;
            }
        };

        for (i, raw) in records.iter().enumerate() {
            let before = issues.len();
            let Some(record) = normalize_node(raw, key, i, issues) else {
                if issues[before..].iter().any(is_missing_location) {
                    result.dropped_no_location += 1;
                }
                continue;
            };

            let role = if config.is_local(&record.hostname) {
                NodeRole::Local
            } else {
                NodeRole::Polled
            };
            let node_key = config.key(&record.hostname);

            match index.get(&node_key) {
                Some(&slot) => {
                    debug!(node = %record.hostname, band = %key, "duplicate record, later one wins");
                    result.duplicates += 1;
                    let existing = &mut result.nodes[slot];
                    existing.node.band = Some(band.clone());
                    existing.node.role = role;
                    existing.node.position = record.position;
                    existing.node.telemetry = Some(record.telemetry);
                    existing.links.extend(record.links);
                }
                None => {
                    trace!(node = %record.hostname, band = %key, role = role.as_str(), "classified");
                    index.insert(node_key, result.nodes.len());
                    result.nodes.push(PolledNode {
                        node: Node {
                            hostname: record.hostname,
                            band: Some(band.clone()),
                            role,
                            position: record.position,
                            telemetry: Some(record.telemetry),
                        },
                        links: record.links,
                    });
                }
            }
        }
    }

    result
}

fn is_missing_location(issue: &Issue) -> bool {
    matches!(&issue.kind, IssueKind::MissingField { field } if field == "lat" || field == "lon")
}

// ============================================================================
// Regrouping
// ============================================================================

/// Band key used by [`regroup`] for records whose channel fits no band plan.
pub const REPORT_BAND: &str = "report";

/// Group a flat node report (an array of raw records) into a band document.
///
/// Every known band appears in the output, in table order, even when empty.
/// Records whose band cannot be inferred are kept under their own
/// `unclassified` key with a `MalformedValue` issue on `channel`.
pub fn regroup(report: &[Value], issues: &mut Vec<Issue>) -> Map<String, Value> {
    let mut bands: Map<String, Value> = BAND_TABLE
        .iter()
        .map(|spec| (spec.key.to_string(), Value::Array(Vec::new())))
        .collect();

    for (i, raw) in report.iter().enumerate() {
        let Some(fields) = raw.as_object() else {
            issues.push(Issue::malformed(REPORT_BAND, &format!("#{}", i), "record", raw));
            continue;
        };

        let mut reader = FieldReader::new(fields, REPORT_BAND, format!("#{}", i), issues);
        if let Some(name) = reader.text("node") {
            reader.set_record(name);
        }
        let channel = reader.text("channel");
        let board_id = reader.text("board_id");
        let mesh_rf_on = reader.flag("meshRF").unwrap_or(true);
        let supernode = reader.flag("mesh_supernode").unwrap_or(false);

        let key = match Band::infer(channel.as_deref(), board_id.as_deref(), mesh_rf_on, supernode) {
            Some(band) => band.key().to_string(),
            None => {
                let raw_channel = reader.raw("channel").cloned().unwrap_or(Value::Null);
                let issue = Issue::malformed(REPORT_BAND, reader.record(), "channel", &raw_channel);
                reader.report(issue);
                "unclassified".to_string()
            }
        };

        if let Value::Array(list) = bands.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
            list.push(raw.clone());
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Snapshot {
        Snapshot::from_value(value).unwrap()
    }

    #[test]
    fn test_classify_tags_band_and_local() {
        let config = TopologyConfig {
            local_node: "Alpha".to_string(),
            ..Default::default()
        };
        let snap = snapshot(json!({
            "5ghz": [{"node": "alpha", "lat": 34.0, "lon": -118.0}],
            "noRF": [{"node": "bravo", "lat": 34.1, "lon": -118.1}]
        }));
        let mut issues = Vec::new();
        let result = classify(&snap, &config, &mut issues);

        assert!(issues.is_empty());
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.nodes[0].node.role, NodeRole::Local);
        assert_eq!(result.nodes[0].node.band, Some(Band::Ghz5));
        assert_eq!(result.nodes[1].node.role, NodeRole::Polled);
        assert_eq!(result.nodes[1].node.band, Some(Band::NoRf));
    }

    #[test]
    fn test_unknown_band_passes_through() {
        let snap = snapshot(json!({"60ghz": [{"node": "x", "lat": 34.0, "lon": -118.0}]}));
        let mut issues = Vec::new();
        let result = classify(&snap, &TopologyConfig::default(), &mut issues);

        assert_eq!(result.nodes.len(), 1);
        assert_eq!(
            result.nodes[0].node.band,
            Some(Band::Unclassified("60ghz".to_string()))
        );
        assert_eq!(issues, vec![Issue::unknown_band("60ghz")]);
    }

    #[test]
    fn test_band_that_is_not_a_list() {
        let snap = snapshot(json!({"2ghz": {"node": "x"}, "5ghz": null}));
        let mut issues = Vec::new();
        let result = classify(&snap, &TopologyConfig::default(), &mut issues);
        assert!(result.nodes.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind.as_str(), "malformed_value");
    }

    #[test]
    fn test_duplicate_hostname_last_write_wins() {
        let snap = snapshot(json!({
            "2ghz": [{
                "node": "Alpha", "lat": 34.0, "lon": -118.0, "ssid": "old",
                "link_info": {"10.0.0.2": {"linkType": "RF", "SnR": 10}}
            }],
            "5ghz": [{
                "node": "alpha", "lat": 35.0, "lon": -119.0, "ssid": "new",
                "link_info": {"10.0.0.2": {"linkType": "RF", "SnR": 30}}
            }]
        }));
        let mut issues = Vec::new();
        let result = classify(&snap, &TopologyConfig::default(), &mut issues);

        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.duplicates, 1);
        let alpha = &result.nodes[0];
        assert_eq!(alpha.node.hostname, "Alpha");
        assert_eq!(alpha.node.position.lat, 35.0);
        assert_eq!(alpha.node.position.lon, -119.0);
        assert_eq!(alpha.node.band, Some(Band::Ghz5));
        assert_eq!(
            alpha.node.telemetry.as_ref().and_then(|t| t.ssid.as_deref()),
            Some("new")
        );
        assert_eq!(alpha.links.len(), 2);
        assert_eq!(alpha.links[1].metrics.snr, Some(30.0));
    }

    #[test]
    fn test_dropped_records_are_counted() {
        let snap = snapshot(json!({"2ghz": [
            {"node": "a", "lat": 0, "lon": 0},
            {"lat": 34.0, "lon": -118.0},
            {"node": "b", "lat": 34.0, "lon": -118.0}
        ]}));
        let mut issues = Vec::new();
        let result = classify(&snap, &TopologyConfig::default(), &mut issues);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.dropped_no_location, 1);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_regroup_flat_report() {
        let report = vec![
            json!({"node": "a", "channel": "149", "meshRF": "on"}),
            json!({"node": "b", "channel": 6}),
            json!({"node": "c", "channel": 3, "board_id": "0xe009"}),
            json!({"node": "d", "channel": "None"}),
            json!({"node": "e", "channel": 149, "mesh_supernode": true}),
            json!({"node": "f", "channel": 20}),
        ];
        let mut issues = Vec::new();
        let bands = regroup(&report, &mut issues);

        let names = |key: &str| -> Vec<String> {
            bands[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["node"].as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(names("5ghz"), vec!["a"]);
        assert_eq!(names("2ghz"), vec!["b"]);
        assert_eq!(names("900"), vec!["c"]);
        assert_eq!(names("noRF"), vec!["d"]);
        assert_eq!(names("supernode"), vec!["e"]);
        assert_eq!(names("unclassified"), vec!["f"]);
        assert_eq!(names("3ghz"), Vec::<String>::new());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].record, "f");

        let keys: Vec<&str> = bands.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["900", "2ghz", "3ghz", "5ghz", "noRF", "supernode", "unclassified"]
        );
    }
}
