//! Metric projection: edge + metric key + unit preference → label.
//!
//! Pure formatting. Distances are computed upstream; the projector only picks
//! the unit order and decorates values.

use meshmap_model::{DistanceUnits, Edge, EdgeLabels, MetricKey, MILES_PER_KM};
use serde::Serialize;

/// Label shown for a metric the link did not report.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One metric view of an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub label: String,
    /// The underlying number for styling thresholds, `None` when unknown.
    pub value: Option<f64>,
}

impl Projection {
    fn known(label: String, value: f64) -> Self {
        Self {
            label,
            value: Some(value),
        }
    }

    fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            value: None,
        }
    }

    fn text(label: String) -> Self {
        Self { label, value: None }
    }
}

/// Project an edge under one metric.
pub fn project(edge: &Edge, key: MetricKey, units: DistanceUnits) -> Projection {
    let m = &edge.metrics;
    match key {
        MetricKey::Distance if !edge.link_type.is_rf() => Projection::text(destination_and_type(edge)),
        MetricKey::Distance => match distance_pair(edge) {
            Some((km, mi)) => {
                let value = match units {
                    DistanceUnits::Kilometers => km,
                    DistanceUnits::Miles => mi,
                };
                Projection::known(format_distance(km, mi, units), value)
            }
            None => Projection::unknown(),
        },
        MetricKey::TxRate => m
            .tx_rate
            .map(|v| Projection::known(format!("{:.1} Mbps", v), v))
            .unwrap_or_else(Projection::unknown),
        MetricKey::Throughput => m
            .throughput
            .map(|v| Projection::known(format!("{:.1} Mbps", v), v))
            .unwrap_or_else(Projection::unknown),
        MetricKey::Snr => m
            .snr
            .map(|v| Projection::known(format!("{} dB", v), v))
            .unwrap_or_else(Projection::unknown),
        MetricKey::Cost => m
            .cost
            .map(|v| Projection::known(format!("{:.2}", v), v))
            .unwrap_or_else(Projection::unknown),
        MetricKey::Quality => m
            .quality
            .map(|v| Projection::known(format!("{}%", v), v))
            .unwrap_or_else(Projection::unknown),
        MetricKey::Supernode => Projection {
            label: destination_and_type(edge),
            value: m.cost,
        },
    }
}

/// Project an edge under every metric key, in [`MetricKey::ALL`] order.
pub fn project_all(edge: &Edge, units: DistanceUnits) -> Vec<(MetricKey, Projection)> {
    MetricKey::ALL
        .iter()
        .map(|&key| (key, project(edge, key, units)))
        .collect()
}

/// Destination and link type, plus distance for located RF links.
pub fn summary_label(edge: &Edge, units: DistanceUnits) -> String {
    let base = destination_and_type(edge);
    match distance_pair(edge) {
        Some((km, mi)) if edge.link_type.is_rf() => {
            format!("{} {}", base, format_distance(km, mi, units))
        }
        _ => base,
    }
}

/// Both label views for the selected metric.
pub fn edge_labels(edge: &Edge, key: MetricKey, units: DistanceUnits) -> EdgeLabels {
    EdgeLabels {
        summary: summary_label(edge, units),
        metric: project(edge, key, units).label,
    }
}

/// `"12.34 km (7.67 mi)"` or `"7.67 mi (12.34 km)"`.
pub fn format_distance(km: f64, mi: f64, units: DistanceUnits) -> String {
    match units {
        DistanceUnits::Kilometers => format!("{:.2} km ({:.2} mi)", km, mi),
        DistanceUnits::Miles => format!("{:.2} mi ({:.2} km)", mi, km),
    }
}

fn destination_and_type(edge: &Edge) -> String {
    format!("{} ({})", edge.destination, edge.link_type)
}

fn distance_pair(edge: &Edge) -> Option<(f64, f64)> {
    match (edge.metrics.distance_km, edge.metrics.distance_miles) {
        (Some(km), Some(mi)) => Some((km, mi)),
        (Some(km), None) => Some((km, km * MILES_PER_KM)),
        (None, Some(mi)) => Some((mi / MILES_PER_KM, mi)),
        (None, None) => None,
    }
}
