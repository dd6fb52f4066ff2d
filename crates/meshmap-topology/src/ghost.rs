//! Ghost resolution.
//!
//! A neighbor that shows up in a link table but was never polled becomes a
//! ghost node at the coordinates of the first link that located it. Link
//! entries that carry no hostname are matched to polled nodes by WLAN IP.

use crate::config::TopologyConfig;
use meshmap_model::{Edge, GeoPoint, Node};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// An edge whose destination could not be located.
///
/// The edge stays in the topology; the renderer should not draw its far end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingEdge {
    pub source: String,
    pub destination: String,
    pub neighbor_ip: String,
}

/// Synthesize ghost nodes and locate edge destinations.
///
/// `nodes` holds the polled node set on entry; ghosts are appended to it.
/// Every edge whose destination is polled or a ghost ends up with `to` set.
/// An edge named only by its neighbor IP is renamed to the polled node
/// holding that WLAN IP. The rest are returned as dangling.
pub fn resolve_ghosts(
    nodes: &mut Vec<Node>,
    edges: &mut [Edge],
    config: &TopologyConfig,
) -> Vec<DanglingEdge> {
    let polled: HashMap<String, GeoPoint> = nodes
        .iter()
        .filter(|n| n.role.is_polled())
        .map(|n| (config.key(&n.hostname), n.position))
        .collect();
    let by_wlan_ip: HashMap<String, (String, GeoPoint)> = nodes
        .iter()
        .filter(|n| n.role.is_polled())
        .filter_map(|n| {
            let ip = n.telemetry.as_ref()?.wlan_ip.clone()?;
            Some((ip, (n.hostname.clone(), n.position)))
        })
        .collect();
    let mut ghosts: HashMap<String, GeoPoint> = HashMap::new();
    let mut unresolved: Vec<usize> = Vec::new();

    for (i, edge) in edges.iter_mut().enumerate() {
        if edge.destination == edge.neighbor_ip {
            if let Some((hostname, position)) = by_wlan_ip.get(edge.neighbor_ip.as_str()) {
                trace!(ip = %edge.neighbor_ip, node = %hostname, "matched by wlan ip");
                edge.destination = hostname.clone();
                edge.to.get_or_insert(*position);
                continue;
            }
        }
        let key = config.key(&edge.destination);
        if let Some(&position) = polled.get(&key) {
            edge.to.get_or_insert(position);
            continue;
        }
        match edge.to {
            Some(position) => {
                if let std::collections::hash_map::Entry::Vacant(slot) = ghosts.entry(key) {
                    debug!(ghost = %edge.destination, via = %edge.source, "registering ghost node");
                    slot.insert(position);
                    nodes.push(Node::ghost(edge.destination.clone(), position));
                }
            }
            None => unresolved.push(i),
        }
    }

    // A ghost may be located by an edge that comes after one that names it
    // without coordinates.
    let mut dangling = Vec::new();
    let mut reported: HashSet<(String, String)> = HashSet::new();
    for i in unresolved {
        let edge = &mut edges[i];
        let key = config.key(&edge.destination);
        if let Some(&position) = ghosts.get(&key) {
            trace!(ghost = %edge.destination, via = %edge.source, "located by ghost");
            edge.to = Some(position);
            continue;
        }
        if reported.insert((edge.source.clone(), edge.neighbor_ip.clone())) {
            debug!(destination = %edge.destination, via = %edge.source, "dangling edge");
            dangling.push(DanglingEdge {
                source: edge.source.clone(),
                destination: edge.destination.clone(),
                neighbor_ip: edge.neighbor_ip.clone(),
            });
        }
    }

    dangling
}
