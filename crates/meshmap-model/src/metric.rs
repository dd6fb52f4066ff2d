//! Edge metric selection and distance units.

use serde::{Deserialize, Serialize};

/// Which edge metric the rendering layer is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    /// Path length, in the preferred unit first.
    #[default]
    Distance,
    /// PHY transmit rate.
    TxRate,
    /// Measured throughput.
    Throughput,
    /// Signal-to-noise ratio.
    Snr,
    /// Routing cost.
    Cost,
    /// Link quality percentage.
    Quality,
    /// Supernode layer view.
    Supernode,
}

impl MetricKey {
    pub const ALL: [MetricKey; 7] = [
        MetricKey::Distance,
        MetricKey::TxRate,
        MetricKey::Throughput,
        MetricKey::Snr,
        MetricKey::Cost,
        MetricKey::Quality,
        MetricKey::Supernode,
    ];

    /// The camelCase key the rendering layer uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Distance => "distance",
            MetricKey::TxRate => "txRate",
            MetricKey::Throughput => "throughput",
            MetricKey::Snr => "snr",
            MetricKey::Cost => "cost",
            MetricKey::Quality => "quality",
            MetricKey::Supernode => "supernode",
        }
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = MetricKey::ALL.iter().map(MetricKey::as_str).collect();
                format!("unknown metric '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Which distance unit is shown first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnits {
    Kilometers,
    #[default]
    Miles,
}

impl DistanceUnits {
    pub fn from_kilometers_flag(kilometers: bool) -> Self {
        if kilometers {
            DistanceUnits::Kilometers
        } else {
            DistanceUnits::Miles
        }
    }
}

impl std::str::FromStr for DistanceUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Ok(DistanceUnits::Kilometers),
            "mi" | "miles" => Ok(DistanceUnits::Miles),
            other => Err(format!("unknown distance unit '{}' (expected km or mi)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_key_parse() {
        assert_eq!("txRate".parse::<MetricKey>(), Ok(MetricKey::TxRate));
        assert_eq!("SNR".parse::<MetricKey>(), Ok(MetricKey::Snr));
        assert!("rssi".parse::<MetricKey>().is_err());
    }

    #[test]
    fn test_metric_key_serde() {
        let json = serde_json::to_string(&MetricKey::TxRate).unwrap();
        assert_eq!(json, "\"txRate\"");
        for key in MetricKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_distance_units() {
        assert_eq!("km".parse::<DistanceUnits>(), Ok(DistanceUnits::Kilometers));
        assert_eq!("Miles".parse::<DistanceUnits>(), Ok(DistanceUnits::Miles));
        assert_eq!(DistanceUnits::default(), DistanceUnits::Miles);
        assert_eq!(
            DistanceUnits::from_kilometers_flag(true),
            DistanceUnits::Kilometers
        );
    }
}
