//! Link table entries and the edges built from them.

use crate::band::Band;
use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};

// ============================================================================
// Link Type
// ============================================================================

/// How two nodes are connected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LinkType {
    /// Mesh radio.
    Rf,
    /// Device-to-device (ethernet cable).
    Dtd,
    /// Legacy vtun tunnel.
    Tunnel,
    /// Wireguard tunnel.
    Wireguard,
    /// Cross-link.
    Xlink,
    /// Anything else the firmware reports.
    Other(String),
}

impl LinkType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "RF" => LinkType::Rf,
            "DTD" => LinkType::Dtd,
            "TUN" | "TUNNEL" => LinkType::Tunnel,
            "WIREGUARD" => LinkType::Wireguard,
            "XLINK" => LinkType::Xlink,
            _ => LinkType::Other(s.trim().to_string()),
        }
    }

    pub fn is_rf(&self) -> bool {
        matches!(self, LinkType::Rf)
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkType::Rf => "RF",
            LinkType::Dtd => "DTD",
            LinkType::Tunnel => "TUN",
            LinkType::Wireguard => "WIREGUARD",
            LinkType::Xlink => "XLINK",
            LinkType::Other(s) => s,
        }
    }
}

impl From<String> for LinkType {
    fn from(s: String) -> Self {
        LinkType::parse(&s)
    }
}

impl From<LinkType> for String {
    fn from(t: LinkType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Link Metrics
// ============================================================================

/// Metrics carried by a link. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMetrics {
    /// PHY transmit rate in Mbps.
    pub tx_rate: Option<f64>,
    /// Measured throughput in Mbps.
    pub throughput: Option<f64>,
    /// Signal-to-noise ratio in dB.
    pub snr: Option<f64>,
    /// Routing cost (ETX for OLSR, metric for Babel).
    pub cost: Option<f64>,
    /// Link quality percentage.
    pub quality: Option<f64>,
    pub distance_km: Option<f64>,
    pub distance_miles: Option<f64>,
    /// Initial bearing from source to destination, degrees from north.
    pub bearing: Option<f64>,
}

/// One normalized entry of a node's link table.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    /// The link table key.
    pub neighbor_ip: String,
    /// Neighbor hostname, when the firmware reported one.
    pub hostname: Option<String>,
    pub link_type: LinkType,
    pub metrics: LinkMetrics,
    /// Neighbor coordinates, when known to the reporting node.
    pub position: Option<GeoPoint>,
}

impl LinkRecord {
    /// The name the destination is displayed and matched by.
    pub fn display_hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.neighbor_ip)
    }
}

// ============================================================================
// Edge
// ============================================================================

/// Pre-rendered labels for an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeLabels {
    /// Destination and link type, plus distance for RF links.
    pub summary: String,
    /// The label for the metric selected for this pass.
    pub metric: String,
}

/// A directed link from a polled node to one of its neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Hostname of the node whose link table produced this edge.
    pub source: String,
    /// Display hostname of the neighbor.
    pub destination: String,
    pub neighbor_ip: String,
    pub link_type: LinkType,
    /// Band of the source node, for layer placement.
    pub source_band: Band,
    pub metrics: LinkMetrics,
    pub from: GeoPoint,
    /// `None` when neither the link nor the merged node set locates the
    /// destination.
    pub to: Option<GeoPoint>,
    pub labels: EdgeLabels,
}
