//! Routing protocol detection from firmware version strings.
//!
//! Release firmware uses dotted versions (`3.25.5.0`), nightly builds use
//! `YYYYMMDD-<hash>`, and Babel-only builds are prefixed with `babel-`.
//! Builds at or past the cutoffs run Babel alongside OLSR.

use chrono::{DateTime, TimeDelta, Utc};
use meshmap_model::{Protocol, ProtocolConfig, Telemetry};

/// Parsed cutoffs for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolCutoffs {
    version: u64,
    nightly: u64,
    /// `None` when the configured threshold does not fit a `TimeDelta`.
    threshold: Option<TimeDelta>,
}

impl ProtocolCutoffs {
    /// Parse configured cutoffs, falling back to the defaults for any that
    /// do not parse.
    pub fn from_config(config: &ProtocolConfig) -> Self {
        let defaults = ProtocolConfig::default();
        let version = version_to_int(&config.version_cutoff)
            .or_else(|| version_to_int(&defaults.version_cutoff))
            .unwrap_or(3_250_500);
        let nightly = nightly_to_int(&config.nightly_cutoff)
            .or_else(|| nightly_to_int(&defaults.nightly_cutoff))
            .unwrap_or(20_250_507);
        Self {
            version,
            nightly,
            threshold: TimeDelta::try_seconds(config.threshold_secs),
        }
    }

    /// Classify a node's firmware.
    ///
    /// Nodes with no `last_seen`, or not seen within the threshold of `now`,
    /// are [`Protocol::Unknown`]. A threshold reaching past the representable
    /// date range treats every seen node as fresh.
    pub fn detect(
        &self,
        firmware: Option<&str>,
        last_seen: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Protocol {
        let Some(last_seen) = last_seen else {
            return Protocol::Unknown;
        };
        let oldest_fresh = self.threshold.and_then(|t| now.checked_sub_signed(t));
        if oldest_fresh.is_some_and(|oldest| last_seen < oldest) {
            return Protocol::Unknown;
        }
        let Some(version) = firmware.map(str::trim).filter(|v| !v.is_empty()) else {
            return Protocol::Unknown;
        };

        if version.starts_with("babel-") {
            return Protocol::BabelOnly;
        }
        let combo = if is_release_version(version) {
            version_to_int(version).map(|v| v >= self.version)
        } else if is_nightly_version(version) {
            nightly_to_int(version).map(|n| n >= self.nightly)
        } else {
            None
        };
        match combo {
            Some(true) => Protocol::Combo,
            Some(false) => Protocol::OlsrOnly,
            None => Protocol::Unknown,
        }
    }

    pub fn detect_telemetry(&self, telemetry: &Telemetry, now: DateTime<Utc>) -> Protocol {
        self.detect(telemetry.firmware_version.as_deref(), telemetry.last_seen, now)
    }
}

/// `a.b.c.d` with one or two digits per part.
fn is_release_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit()))
}

/// `YYYYMMDD-` followed by a 7 or 8 digit hex hash.
fn is_nightly_version(version: &str) -> bool {
    let Some((date, hash)) = version.split_once('-') else {
        return false;
    };
    date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && (7..=8).contains(&hash.len())
        && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Sortable integer for a dotted version; missing trailing parts are zero.
fn version_to_int(version: &str) -> Option<u64> {
    let parts = version
        .trim()
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    if parts.is_empty() || parts.len() > 4 {
        return None;
    }
    let weights = [1_000_000, 10_000, 100, 1];
    Some(parts.iter().zip(weights).map(|(p, w)| p * w).sum())
}

fn nightly_to_int(nightly: &str) -> Option<u64> {
    nightly.trim().split('-').next()?.parse().ok()
}
