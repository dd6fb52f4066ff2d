//! Metric declarations for the MeshMap topology engine.
//!
//! Every gauge, counter and histogram a topology pass records is declared
//! once in [`metric_defs`], so the pipeline and the `meshmap metrics`
//! listing agree on names, units and label keys.
//!
//! ```rust
//! use meshmap_metrics::{metric_defs, MetricKind};
//!
//! assert_eq!(metric_defs::TOPOLOGY_ISSUES.kind, MetricKind::Counter);
//! assert_eq!(metric_defs::TOPOLOGY_ISSUES.labels, &["kind"]);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        })
    }
}

/// One recorded metric. Counts are the default unit.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Unit,
    /// Label keys every recording of this metric carries.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(kind: MetricKind, name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            unit: Unit::Count,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str, description: &'static str) -> Self {
        Self::new(MetricKind::Counter, name, description)
    }

    pub const fn gauge(name: &'static str, description: &'static str) -> Self {
        Self::new(MetricKind::Gauge, name, description)
    }

    pub const fn histogram(name: &'static str, description: &'static str) -> Self {
        Self::new(MetricKind::Histogram, name, description)
    }

    pub const fn in_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub const fn labelled(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder, if any.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, self.unit, self.description),
            MetricKind::Gauge => describe_gauge!(self.name, self.unit, self.description),
            MetricKind::Histogram => {
                describe_histogram!(self.name, self.unit, self.description)
            }
        }
    }
}

/// All metric definitions for the topology engine.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Topology Pass
    // ========================================================================

    /// Nodes in the merged node set after a pass.
    ///
    /// Labels: role (polled, local, ghost)
    pub const TOPOLOGY_NODES: Metric = Metric::gauge("meshmap.topology.nodes", "Nodes in the merged node set")
        .labelled(&["role"]);

    /// Edges produced by a pass.
    ///
    /// Labels: link_type (RF, DTD, TUN, ...)
    pub const TOPOLOGY_EDGES: Metric = Metric::gauge("meshmap.topology.edges", "Edges produced from link tables")
        .labelled(&["link_type"]);

    pub const TOPOLOGY_GHOSTS: Metric = Metric::gauge(
        "meshmap.topology.ghosts",
        "Ghost nodes synthesized from link tables",
    );

    pub const TOPOLOGY_DANGLING_EDGES: Metric = Metric::gauge(
        "meshmap.topology.dangling_edges",
        "Edges whose destination could not be located",
    );

    /// Problems found in snapshot records.
    ///
    /// Labels: kind (missing_field, malformed_value, unknown_category)
    pub const TOPOLOGY_ISSUES: Metric = Metric::counter("meshmap.topology.issues", "Problems found in snapshot records")
        .labelled(&["kind"]);

    pub const TOPOLOGY_PASSES: Metric = Metric::counter("meshmap.topology.passes", "Aggregation passes completed");

    pub const TOPOLOGY_BUILD_TIME: Metric = Metric::histogram(
        "meshmap.topology.build_time_us",
        "Wall-clock time of one aggregation pass",
    )
    .in_unit(Unit::Microseconds);

    pub const ALL: &[&Metric] = &[
        &TOPOLOGY_NODES,
        &TOPOLOGY_EDGES,
        &TOPOLOGY_GHOSTS,
        &TOPOLOGY_DANGLING_EDGES,
        &TOPOLOGY_ISSUES,
        &TOPOLOGY_PASSES,
        &TOPOLOGY_BUILD_TIME,
    ];
}

/// Register descriptions for every metric in [`metric_defs::ALL`].
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_builders() {
        const M: Metric = Metric::histogram("x.y", "desc")
            .in_unit(Unit::Microseconds)
            .labelled(&["a", "b"]);
        assert_eq!(M.name, "x.y");
        assert_eq!(M.kind, MetricKind::Histogram);
        assert_eq!(M.description, "desc");
        assert_eq!(M.unit, Unit::Microseconds);
        assert_eq!(M.labels, &["a", "b"]);

        assert_eq!(Metric::gauge("g", "").unit, Unit::Count);
    }

    #[test]
    fn test_every_metric_is_described() {
        assert!(metric_defs::ALL.iter().all(|m| !m.description.is_empty()));
    }

    #[test]
    fn test_all_metrics_are_namespaced_and_unique() {
        let mut names: Vec<&str> = metric_defs::ALL.iter().map(|m| m.name).collect();
        assert!(names.iter().all(|n| n.starts_with("meshmap.")));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }

    #[test]
    fn test_describe_without_recorder() {
        // No recorder installed: describing is a no-op and must not panic.
        describe_metrics();
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MetricKind::Counter.to_string(), "counter");
        assert_eq!(MetricKind::Histogram.to_string(), "histogram");
    }
}
