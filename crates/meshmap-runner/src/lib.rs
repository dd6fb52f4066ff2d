//! # meshmap-runner
//!
//! File-level commands behind the `meshmap` binary: load a snapshot and map
//! configuration, run a topology pass, format a node's services, and regroup
//! a flat node report into a band document.

use chrono::{DateTime, Utc};
use meshmap_model::{parse_timestamp, DistanceUnits, Issue, MapConfig, MetricKey};
use meshmap_topology::{
    build_topology, regroup, ServiceLinks, Snapshot, SnapshotError, Topology, TopologyConfig,
};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by runner commands.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Configuration error: {0}")]
    Config(#[from] meshmap_model::ConfigError),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;

// ============================================================================
// Loading
// ============================================================================

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let json = read_file(path)?;
    Ok(Snapshot::from_json_str(&json)?)
}

/// Load the YAML map configuration, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<MapConfig> {
    match path {
        Some(path) => {
            let yaml = read_file(path)?;
            Ok(MapConfig::from_yaml_str(&yaml)?)
        }
        None => Ok(MapConfig::default()),
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub local_node: Option<String>,
    pub units: Option<DistanceUnits>,
    pub metric: Option<MetricKey>,
    /// Reference time for protocol freshness, as written in snapshots.
    pub now: Option<String>,
}

/// Resolve pass settings: flags, then the config file, then the snapshot's
/// `mapInfo`, then defaults.
pub fn resolve_config(
    config: &MapConfig,
    snapshot: &Snapshot,
    overrides: &Overrides,
) -> Result<TopologyConfig> {
    let mut resolved = TopologyConfig::resolve(config, snapshot.map_info());
    if let Some(local_node) = &overrides.local_node {
        resolved.local_node = local_node.clone();
    }
    if let Some(units) = overrides.units {
        resolved.units = units;
    }
    if let Some(metric) = overrides.metric {
        resolved.metric = metric;
    }
    if let Some(now) = &overrides.now {
        resolved.reference_time = Some(parse_reference_time(now)?);
    }
    Ok(resolved)
}

fn parse_reference_time(text: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(text)
        .ok_or_else(|| RunnerError::InvalidArgument(format!("unrecognized timestamp '{}'", text)))
}

// ============================================================================
// Commands
// ============================================================================

/// Build the topology for a snapshot file.
pub fn topology_command(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> Result<Topology> {
    let snapshot = load_snapshot(snapshot_path)?;
    let config = load_config(config_path)?;
    let resolved = resolve_config(&config, &snapshot, overrides)?;
    info!(
        snapshot = %snapshot_path.display(),
        local_node = %resolved.local_node,
        metric = %resolved.metric,
        "building topology"
    );

    let topology = build_topology(&snapshot, &resolved);
    for issue in &topology.issues {
        warn!("{}", issue);
    }
    Ok(topology)
}

/// Format the published services of one node.
pub fn services_command(
    snapshot_path: &Path,
    config_path: Option<&Path>,
    hostname: &str,
) -> Result<ServiceLinks> {
    let snapshot = load_snapshot(snapshot_path)?;
    let config = load_config(config_path)?;
    let resolved = resolve_config(&config, &snapshot, &Overrides::default())?;
    let topology = build_topology(&snapshot, &resolved);
    topology
        .services(hostname, &resolved)
        .ok_or_else(|| RunnerError::NodeNotFound(hostname.to_string()))
}

/// Regroup a flat node report file into a band document.
pub fn classify_command(report_path: &Path) -> Result<(Value, Vec<Issue>)> {
    let json = read_file(report_path)?;
    let report: Value = serde_json::from_str(&json)?;
    let Value::Array(records) = report else {
        return Err(RunnerError::InvalidArgument(format!(
            "{} must contain a JSON array of node records",
            report_path.display()
        )));
    };

    let mut issues = Vec::new();
    let bands = regroup(&records, &mut issues);
    info!(records = records.len(), bands = bands.len(), "regrouped node report");
    Ok((Value::Object(bands), issues))
}

/// Write `text` to `path`, or stdout when no path is given.
pub fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{}\n", text)).map_err(|source| {
            RunnerError::Io {
                path: path.to_path_buf(),
                source,
            }
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text)?;
            Ok(())
        }
    }
}
