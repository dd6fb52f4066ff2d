//! # meshmap-model
//!
//! Canonical data model for MeshMap topology snapshots.
//!
//! A snapshot is the JSON document the polling backend writes once per poll
//! cycle: node records grouped by band key, each carrying display telemetry
//! and a link table keyed by neighbor IP. This crate defines the canonical
//! types those records are normalized into and the rules for doing so.
//!
//! ## Modules
//!
//! - [`band`]: the band enumeration and the table that drives classification
//! - [`node`] / [`link`]: merged nodes, link table entries, edges
//! - [`normalize`]: raw record → canonical record, tolerating dirty input
//! - [`issue`]: the non-fatal problem list returned next to every topology
//! - [`config`]: YAML map configuration

pub mod band;
pub mod config;
pub mod geo;
pub mod issue;
pub mod link;
pub mod metric;
pub mod node;
pub mod normalize;
pub mod value;

pub use band::{Band, BandSpec, BAND_900_BOARD_IDS, BAND_TABLE};
pub use config::{ConfigError, MapConfig, ProtocolConfig, DEFAULT_LOCAL_DOMAIN};
pub use geo::GeoPoint;
pub use issue::{Issue, IssueKind};
pub use link::{Edge, EdgeLabels, LinkMetrics, LinkRecord, LinkType};
pub use metric::{DistanceUnits, MetricKey};
pub use node::{hostname_key, Node, NodeRole, Protocol, ServicePayload, Telemetry};
pub use normalize::{normalize_node, parse_timestamp, NodeRecord, MILES_PER_KM};
