//! Map configuration loaded from YAML.
//!
//! Every key is optional. Keys left unset fall back to what the snapshot's
//! `mapInfo` block says, then to the built-in defaults.
//!
//! ```yaml
//! local_node: KG6WXC-HOME
//! distance_units: kilometers
//! local_domain: .local.mesh
//! metric: snr
//! protocol:
//!   version_cutoff: 3.25.5.0
//!   nightly_cutoff: 20250507-aaaaaaaa
//!   threshold_secs: 604800
//! ```

use crate::metric::{DistanceUnits, MetricKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default mesh DNS suffix.
pub const DEFAULT_LOCAL_DOMAIN: &str = ".local.mesh";

/// Longest accepted `protocol.threshold_secs`, one hundred years.
pub const MAX_THRESHOLD_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Cutoffs used to tell Babel-only, OLSR-only and combo firmware apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// First release version that ships Babel alongside OLSR.
    pub version_cutoff: String,
    /// First nightly build that ships Babel alongside OLSR.
    pub nightly_cutoff: String,
    /// Nodes not seen within this many seconds are reported as unknown.
    pub threshold_secs: i64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version_cutoff: "3.25.5.0".to_string(),
            nightly_cutoff: "20250507-aaaaaaaa".to_string(),
            threshold_secs: 60 * 60 * 24 * 7,
        }
    }
}

/// User-facing map settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Hostname of the node the map is served from.
    pub local_node: Option<String>,
    pub distance_units: Option<DistanceUnits>,
    /// DNS suffix appended to bare service hostnames.
    pub local_domain: Option<String>,
    /// Metric used for the pre-rendered edge label.
    pub metric: Option<MetricKey>,
    pub protocol: ProtocolConfig,
}

impl MapConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(domain) = &self.local_domain {
            let trimmed = domain.trim().trim_start_matches('.');
            if trimmed.is_empty() || trimmed.contains(['/', ':', ' ']) {
                return Err(ConfigError::Invalid(format!(
                    "local_domain '{}' is not a DNS suffix",
                    domain
                )));
            }
        }
        if let Some(node) = &self.local_node {
            if node.trim().is_empty() {
                return Err(ConfigError::Invalid("local_node is empty".to_string()));
            }
        }
        if !(1..=MAX_THRESHOLD_SECS).contains(&self.protocol.threshold_secs) {
            return Err(ConfigError::Invalid(format!(
                "protocol.threshold_secs must be between 1 and {}, got {}",
                MAX_THRESHOLD_SECS, self.protocol.threshold_secs
            )));
        }
        Ok(())
    }

    /// The configured domain suffix with a leading dot, lowercased.
    pub fn local_domain(&self) -> String {
        let domain = self
            .local_domain
            .as_deref()
            .unwrap_or(DEFAULT_LOCAL_DOMAIN)
            .trim()
            .trim_start_matches('.')
            .to_lowercase();
        format!(".{}", domain)
    }
}
