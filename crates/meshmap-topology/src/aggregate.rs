//! Link aggregation.
//!
//! Walks every polled node's link table and emits one directed edge per
//! (source, neighbor) pair.

use crate::classify::PolledNode;
use crate::config::TopologyConfig;
use meshmap_model::{Band, Edge, EdgeLabels};
use std::collections::HashMap;
use tracing::trace;

/// Build edges from every polled node's link table.
///
/// Edge identity is the lowercased source hostname and the neighbor IP.
/// When a pair repeats, the later entry overwrites the earlier one in place,
/// so the edge keeps its first position in the output. Labels are left
/// empty; destinations are only as located as the link record says.
pub fn aggregate(nodes: &[PolledNode], config: &TopologyConfig) -> Vec<Edge> {
    let mut edges: Vec<Edge> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for polled in nodes {
        let source = &polled.node;
        let source_key = config.key(&source.hostname);
        let source_band = source
            .band
            .clone()
            .unwrap_or_else(|| Band::Unclassified(String::new()));

        for link in &polled.links {
            let edge = Edge {
                source: source.hostname.clone(),
                destination: link.display_hostname().to_string(),
                neighbor_ip: link.neighbor_ip.clone(),
                link_type: link.link_type.clone(),
                source_band: source_band.clone(),
                metrics: link.metrics.clone(),
                from: source.position,
                to: link.position,
                labels: EdgeLabels::default(),
            };

            let key = (source_key.clone(), link.neighbor_ip.clone());
            match index.get(&key) {
                Some(&slot) => {
                    trace!(
                        source = %edge.source,
                        neighbor = %edge.neighbor_ip,
                        "link reported again, replacing earlier entry"
                    );
                    edges[slot] = edge;
                }
                None => {
                    index.insert(key, edges.len());
                    edges.push(edge);
                }
            }
        }
    }

    edges
}
