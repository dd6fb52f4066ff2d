//! # meshmap-topology
//!
//! Turns one MeshMap snapshot into a renderable topology.
//!
//! A pass runs, in order:
//!
//! 1. **Classification**: band document → one node set tagged with band and
//!    role ([`classify`])
//! 2. **Link aggregation**: link tables → directed edges, one per
//!    (source, neighbor) pair ([`aggregate`])
//! 3. **Ghost resolution**: unpolled neighbors with coordinates become ghost
//!    nodes; unlocated ones are listed as dangling ([`ghost`])
//! 4. **Projection**: summary and metric labels per edge ([`project`])
//!
//! Service links are formatted separately, per node, on demand
//! ([`services`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use meshmap_topology::{build_topology, Snapshot, TopologyConfig};
//!
//! let snapshot = Snapshot::from_json_str(&std::fs::read_to_string("map_data.json")?)?;
//! let config = TopologyConfig::resolve(&map_config, snapshot.map_info());
//! let topology = build_topology(&snapshot, &config);
//! println!("{} nodes, {} edges", topology.nodes.len(), topology.edges.len());
//! ```

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod geo;
pub mod ghost;
pub mod pipeline;
pub mod project;
pub mod protocol;
pub mod services;
pub mod snapshot;
pub mod stats;

pub use aggregate::aggregate;
pub use classify::{classify, regroup, Classification, PolledNode};
pub use config::{TopologyConfig, DEFAULT_LOCAL_NODE};
pub use geo::{backfill_distance, haversine_km, initial_bearing};
pub use ghost::{resolve_ghosts, DanglingEdge};
pub use pipeline::{build_topology, Topology};
pub use project::{edge_labels, format_distance, project, project_all, summary_label, Projection};
pub use protocol::ProtocolCutoffs;
pub use services::{format_services, rewrite_link, ServiceLink, ServiceLinks, NO_SERVICES_LABEL};
pub use snapshot::{MapInfo, Snapshot, SnapshotError};
pub use stats::TopologyStats;
