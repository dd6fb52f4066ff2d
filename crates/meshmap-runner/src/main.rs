//! # meshmap
//!
//! CLI entry point for the MeshMap topology engine.

use clap::{Parser, Subcommand};
use meshmap_model::{DistanceUnits, MetricKey};
use meshmap_runner::{
    classify_command, services_command, topology_command, write_output, Overrides, RunnerError,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// CLI Configuration
// ============================================================================

/// MeshMap - mesh network topology builder
#[derive(Parser, Debug)]
#[command(name = "meshmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log filter (e.g. "debug", "meshmap_topology=trace"). Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the topology (nodes, edges, ghosts) for a snapshot
    Topology(TopologyArgs),
    /// Print the published services of one node
    Services(ServicesArgs),
    /// Regroup a flat node report into a band document
    Classify(ClassifyArgs),
    /// List all metrics recorded by a topology pass
    Metrics,
}

#[derive(Parser, Debug)]
pub struct TopologyArgs {
    /// Snapshot JSON (band document or map_data.json envelope)
    #[arg(long)]
    pub snapshot: PathBuf,

    /// YAML map configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Metric for edge labels: distance, txRate, throughput, snr, cost, quality, supernode
    #[arg(long)]
    pub metric: Option<MetricKey>,

    /// Distance shown first: km or mi
    #[arg(long)]
    pub units: Option<DistanceUnits>,

    /// Hostname of the node the map is served from
    #[arg(long)]
    pub local_node: Option<String>,

    /// Reference time for firmware protocol freshness (default: newest last_seen)
    #[arg(long)]
    pub now: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ServicesArgs {
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Hostname of the node to list
    #[arg(long)]
    pub node: String,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// JSON array of raw node records
    #[arg(long)]
    pub report: PathBuf,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn main() -> Result<(), RunnerError> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    meshmap_metrics::describe_metrics();

    match cli.command {
        Commands::Topology(args) => {
            let overrides = Overrides {
                local_node: args.local_node,
                units: args.units,
                metric: args.metric,
                now: args.now,
            };
            let topology = topology_command(&args.snapshot, args.config.as_deref(), &overrides)?;
            let json = serde_json::to_string_pretty(&topology)?;
            write_output(&json, args.output.as_deref())?;
        }
        Commands::Services(args) => {
            let links = services_command(&args.snapshot, args.config.as_deref(), &args.node)?;
            println!("{}", links);
        }
        Commands::Classify(args) => {
            let (bands, issues) = classify_command(&args.report)?;
            for issue in &issues {
                tracing::warn!("{}", issue);
            }
            let json = serde_json::to_string_pretty(&bands)?;
            write_output(&json, args.output.as_deref())?;
        }
        Commands::Metrics => {
            print_metrics_info();
        }
    }

    Ok(())
}

/// Print information about all available metrics
fn print_metrics_info() {
    use meshmap_metrics::metric_defs;

    println!("MeshMap Metrics");
    println!("===============\n");

    for metric in metric_defs::ALL {
        println!("  {}", metric.name);
        println!("    Type: {} ({})", metric.kind, metric.unit.as_str());
        println!("    Description: {}", metric.description);
        if !metric.labels.is_empty() {
            println!("    Labels: {}", metric.labels.join(", "));
        }
        println!();
    }
}
