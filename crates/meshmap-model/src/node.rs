//! Nodes of the merged topology.

use crate::band::Band;
use crate::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a node came to be in the merged node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Listed in the snapshot.
    Polled,
    /// Listed in the snapshot and is the node the map is served from.
    Local,
    /// Only seen in another node's link table.
    Ghost,
}

impl NodeRole {
    pub fn is_polled(&self) -> bool {
        !matches!(self, NodeRole::Ghost)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Polled => "polled",
            NodeRole::Local => "local",
            NodeRole::Ghost => "ghost",
        }
    }
}

/// Routing protocol a node's firmware runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "Babel Only")]
    BabelOnly,
    #[serde(rename = "OLSR Only")]
    OlsrOnly,
    #[serde(rename = "Combo")]
    Combo,
    #[default]
    #[serde(rename = "Unknown")]
    Unknown,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::BabelOnly => write!(f, "Babel Only"),
            Protocol::OlsrOnly => write!(f, "OLSR Only"),
            Protocol::Combo => write!(f, "Combo"),
            Protocol::Unknown => write!(f, "Unknown"),
        }
    }
}

// ============================================================================
// Service Payload
// ============================================================================

/// The raw shapes a node's published service list arrives in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "entries", rename_all = "camelCase")]
pub enum ServicePayload {
    /// The field was missing or null.
    #[default]
    Absent,
    /// The backend's `"Not Available"` sentinel.
    NotAvailable,
    /// An array of service objects.
    List(Vec<Value>),
    /// A mapping of service key to service object (or bare link).
    Map(Map<String, Value>),
    /// Anything else.
    Unusable(Value),
}

impl ServicePayload {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => ServicePayload::Absent,
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("not available") => {
                ServicePayload::NotAvailable
            }
            Some(Value::Array(items)) => ServicePayload::List(items.clone()),
            Some(Value::Object(map)) => ServicePayload::Map(map.clone()),
            Some(other) => ServicePayload::Unusable(other.clone()),
        }
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// Display-only data reported by a polled node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub ssid: Option<String>,
    pub channel: Option<String>,
    pub freq: Option<String>,
    pub chanbw: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub board_id: Option<String>,
    pub ant_desc: Option<String>,
    pub ant_gain: Option<f64>,
    pub ant_beam: Option<f64>,
    pub uptime: Option<String>,
    pub loadavg: [Option<f64>; 3],
    pub hops_away: Option<u32>,
    pub wlan_ip: Option<String>,
    pub description: Option<String>,
    pub mesh_gateway: bool,
    pub mesh_supernode: bool,
    pub mesh_rf: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub protocol: Protocol,
    pub services: ServicePayload,
}

// ============================================================================
// Node
// ============================================================================

/// A node of the merged topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub hostname: String,
    /// `None` for ghosts, which were never polled for radio details.
    pub band: Option<Band>,
    pub role: NodeRole,
    pub position: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub telemetry: Option<Telemetry>,
}

impl Node {
    pub fn ghost(hostname: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            hostname: hostname.into(),
            band: None,
            role: NodeRole::Ghost,
            position,
            telemetry: None,
        }
    }

    pub fn is_ghost(&self) -> bool {
        self.role == NodeRole::Ghost
    }
}

/// Key used to match hostnames across the snapshot.
///
/// Lowercased, with the mesh domain suffix removed so `bravo` and
/// `BRAVO.local.mesh` name the same node.
pub fn hostname_key(hostname: &str, domain_suffix: &str) -> String {
    let lower = hostname.trim().to_lowercase();
    let suffix = domain_suffix.trim().to_lowercase();
    let suffix = suffix.trim_start_matches('.');
    if suffix.is_empty() {
        return lower;
    }
    match lower.strip_suffix(suffix) {
        Some(stem) if stem.ends_with('.') && stem.len() > 1 => stem[..stem.len() - 1].to_string(),
        _ => lower,
    }
}
