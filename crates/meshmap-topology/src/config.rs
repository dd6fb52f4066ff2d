//! Read-only inputs to one aggregation pass.

use crate::snapshot::MapInfo;
use chrono::{DateTime, Utc};
use meshmap_model::{hostname_key, DistanceUnits, MapConfig, MetricKey, ProtocolConfig};

/// Local node name the backend assumes when none is configured.
pub const DEFAULT_LOCAL_NODE: &str = "localnode.local.mesh";

/// Settings for one pass, resolved from configuration, the snapshot's
/// `mapInfo` block and built-in defaults (in that order).
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyConfig {
    pub local_node: String,
    pub units: DistanceUnits,
    /// Mesh DNS suffix with a leading dot.
    pub local_domain: String,
    pub metric: MetricKey,
    pub protocol: ProtocolConfig,
    /// "Now" for protocol freshness checks. When unset, the newest
    /// `last_seen` in the snapshot is used so a pass stays reproducible.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::resolve(&MapConfig::default(), &MapInfo::default())
    }
}

impl TopologyConfig {
    pub fn resolve(config: &MapConfig, info: &MapInfo) -> Self {
        let local_node = config
            .local_node
            .clone()
            .or_else(|| info.local_node.clone())
            .unwrap_or_else(|| DEFAULT_LOCAL_NODE.to_string());
        let units = config
            .distance_units
            .or_else(|| info.kilometers.map(DistanceUnits::from_kilometers_flag))
            .unwrap_or_default();

        Self {
            local_node,
            units,
            local_domain: config.local_domain(),
            metric: config.metric.unwrap_or_default(),
            protocol: config.protocol.clone(),
            reference_time: None,
        }
    }

    /// Matching key for a hostname under this pass's domain suffix.
    pub fn key(&self, hostname: &str) -> String {
        hostname_key(hostname, &self.local_domain)
    }

    pub fn is_local(&self, hostname: &str) -> bool {
        self.key(hostname) == self.key(&self.local_node)
    }
}
