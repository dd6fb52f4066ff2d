//! Radio band definitions.
//!
//! This module provides:
//! - [`Band`] - The band/role a node is grouped under for rendering
//! - [`BandSpec`] - Per-band rendering metadata (icon role, popup template)
//! - [`BAND_TABLE`] - The table driving classification, one row per known band

use serde::{Deserialize, Serialize};

/// Board ids of the 900MHz radios. Their channel numbers overlap the 2GHz plan.
pub const BAND_900_BOARD_IDS: &[&str] = &["0xe009", "0xe1b9", "0xe239"];

// ============================================================================
// Band
// ============================================================================

/// The band or role a node is rendered under.
///
/// Snapshot documents key their node lists by band. Keys that do not match a
/// known band are kept as [`Band::Unclassified`] so new bands render with a
/// generic style instead of disappearing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Band {
    /// 900MHz radios.
    Mhz900,
    /// 2.4GHz radios.
    Ghz2,
    /// 3.4GHz radios.
    Ghz3,
    /// 5GHz (and 6GHz) radios.
    Ghz5,
    /// Nodes with mesh RF disabled (tunnel or DtD only).
    NoRf,
    /// Supernodes bridging mesh islands.
    Supernode,
    /// A band key this build does not know about.
    Unclassified(String),
}

impl Band {
    /// Look up a band by its snapshot key.
    ///
    /// Matching is exact for the known keys; anything else becomes
    /// [`Band::Unclassified`] carrying the original key.
    pub fn from_key(key: &str) -> Self {
        BAND_TABLE
            .iter()
            .find(|spec| spec.key == key)
            .map(|spec| spec.band.clone())
            .unwrap_or_else(|| Band::Unclassified(key.to_string()))
    }

    /// The snapshot key for this band.
    pub fn key(&self) -> &str {
        match self {
            Band::Unclassified(key) => key,
            known => known.spec().map(|spec| spec.key).unwrap_or_default(),
        }
    }

    /// Rendering metadata, or `None` for unclassified bands.
    pub fn spec(&self) -> Option<&'static BandSpec> {
        BAND_TABLE.iter().find(|spec| &spec.band == self)
    }

    /// Icon role for the rendering layer.
    pub fn icon_role(&self) -> &'static str {
        self.spec().map(|spec| spec.icon_role).unwrap_or("unclassified")
    }

    /// Whether this band is one of the fixed, known bands.
    pub fn is_classified(&self) -> bool {
        !matches!(self, Band::Unclassified(_))
    }

    /// Infer a band from raw radio telemetry.
    ///
    /// Mirrors the grouping the polling backend performs when it writes the
    /// band document: supernodes first, then nodes without mesh RF, then
    /// 900MHz boards (identified by board id), then the channel plan.
    /// Returns `None` when the channel falls outside every plan.
    pub fn infer(
        channel: Option<&str>,
        board_id: Option<&str>,
        mesh_rf_on: bool,
        supernode: bool,
    ) -> Option<Band> {
        if supernode {
            return Some(Band::Supernode);
        }
        let channel = channel.map(str::trim).filter(|c| {
            !c.is_empty() && !c.eq_ignore_ascii_case("none")
        });
        let Some(channel) = channel.filter(|_| mesh_rf_on) else {
            return Some(Band::NoRf);
        };
        if board_id.is_some_and(|id| BAND_900_BOARD_IDS.contains(&id)) {
            return Some(Band::Mhz900);
        }
        let ch: i64 = channel.parse().ok()?;
        match ch {
            ch if ch <= 11 => Some(Band::Ghz2),
            37..=64 | 100..=184 => Some(Band::Ghz5),
            ch if ch >= 3000 => Some(Band::Ghz5),
            76..=99 => Some(Band::Ghz3),
            _ => None,
        }
    }
}

impl From<String> for Band {
    fn from(key: String) -> Self {
        Band::from_key(&key)
    }
}

impl From<Band> for String {
    fn from(band: Band) -> Self {
        band.key().to_string()
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.spec() {
            Some(spec) => f.write_str(spec.label),
            None => write!(f, "Unclassified ({})", self.key()),
        }
    }
}

// ============================================================================
// Band Table
// ============================================================================

/// Rendering metadata for one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSpec {
    /// The band this row describes.
    pub band: Band,
    /// Key used in the snapshot document.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Marker icon role used by the rendering layer.
    pub icon_role: &'static str,
    /// Popup template name used by the rendering layer.
    pub popup_template: &'static str,
}

/// One row per known band, in rendering layer order.
pub const BAND_TABLE: &[BandSpec] = &[
    BandSpec {
        band: Band::Mhz900,
        key: "900",
        label: "900MHz",
        icon_role: "mhz900",
        popup_template: "rf",
    },
    BandSpec {
        band: Band::Ghz2,
        key: "2ghz",
        label: "2GHz",
        icon_role: "ghz2",
        popup_template: "rf",
    },
    BandSpec {
        band: Band::Ghz3,
        key: "3ghz",
        label: "3GHz",
        icon_role: "ghz3",
        popup_template: "rf",
    },
    BandSpec {
        band: Band::Ghz5,
        key: "5ghz",
        label: "5GHz",
        icon_role: "ghz5",
        popup_template: "rf",
    },
    BandSpec {
        band: Band::NoRf,
        key: "noRF",
        label: "No RF",
        icon_role: "norf",
        popup_template: "norf",
    },
    BandSpec {
        band: Band::Supernode,
        key: "supernode",
        label: "Supernode",
        icon_role: "supernode",
        popup_template: "supernode",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_known_bands() {
        assert_eq!(Band::from_key("900"), Band::Mhz900);
        assert_eq!(Band::from_key("2ghz"), Band::Ghz2);
        assert_eq!(Band::from_key("3ghz"), Band::Ghz3);
        assert_eq!(Band::from_key("5ghz"), Band::Ghz5);
        assert_eq!(Band::from_key("noRF"), Band::NoRf);
        assert_eq!(Band::from_key("supernode"), Band::Supernode);
    }

    #[test]
    fn test_unknown_key_passes_through() {
        let band = Band::from_key("24ghz");
        assert_eq!(band, Band::Unclassified("24ghz".to_string()));
        assert_eq!(band.key(), "24ghz");
        assert!(!band.is_classified());
        assert_eq!(band.icon_role(), "unclassified");
    }

    #[test]
    fn test_key_roundtrips_through_table() {
        for spec in BAND_TABLE {
            assert_eq!(spec.band.key(), spec.key);
            assert_eq!(Band::from_key(spec.key), spec.band);
        }
    }

    #[test]
    fn test_serde_uses_key() {
        let json = serde_json::to_string(&Band::NoRf).unwrap();
        assert_eq!(json, "\"noRF\"");
        let band: Band = serde_json::from_str("\"5ghz\"").unwrap();
        assert_eq!(band, Band::Ghz5);
    }

    #[test]
    fn test_infer_from_channel_plan() {
        assert_eq!(Band::infer(Some("6"), None, true, false), Some(Band::Ghz2));
        assert_eq!(Band::infer(Some("-2"), None, true, false), Some(Band::Ghz2));
        assert_eq!(Band::infer(Some("149"), None, true, false), Some(Band::Ghz5));
        assert_eq!(Band::infer(Some("3120"), None, true, false), Some(Band::Ghz5));
        assert_eq!(Band::infer(Some("84"), None, true, false), Some(Band::Ghz3));
        assert_eq!(Band::infer(Some("20"), None, true, false), None);
    }

    #[test]
    fn test_infer_roles_take_precedence() {
        assert_eq!(Band::infer(Some("6"), None, true, true), Some(Band::Supernode));
        assert_eq!(Band::infer(Some("6"), None, false, false), Some(Band::NoRf));
        assert_eq!(Band::infer(Some("None"), None, true, false), Some(Band::NoRf));
        assert_eq!(Band::infer(None, None, true, false), Some(Band::NoRf));
        assert_eq!(Band::infer(Some("4"), Some("0xe1b9"), true, false), Some(Band::Mhz900));
    }
}
