//! Snapshot documents as written by the polling backend.
//!
//! Two layouts are accepted:
//!
//! - a bare band document, `{"2ghz": [...], "5ghz": [...], ...}`
//! - the full `map_data.json` envelope, where the band document sits under
//!   `allDevices` next to `mapInfo` and `pollingInfo`

use meshmap_model::value::coerce_flag;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors reading a snapshot document.
///
/// Only the document as a whole can fail; problems inside individual records
/// are reported as issues instead.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot must be a JSON object keyed by band, found {0}")]
    NotAnObject(&'static str),

    #[error("`allDevices` must be a JSON object keyed by band, found {0}")]
    DevicesNotAnObject(&'static str),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Map defaults published by the backend in the envelope's `mapInfo` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapInfo {
    /// `mapInfo.localnode`
    pub local_node: Option<String>,
    /// `mapInfo.kilometers`
    pub kilometers: Option<bool>,
}

/// One poll cycle's band document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    bands: Map<String, Value>,
    map_info: MapInfo,
}

impl Snapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut document) = value else {
            return Err(SnapshotError::NotAnObject(json_type(&value)));
        };

        if !document.contains_key("allDevices") {
            return Ok(Self {
                bands: document,
                map_info: MapInfo::default(),
            });
        }

        let map_info = document
            .get("mapInfo")
            .and_then(Value::as_object)
            .map(read_map_info)
            .unwrap_or_default();
        match document.remove("allDevices") {
            Some(Value::Object(bands)) => Ok(Self { bands, map_info }),
            Some(other) => Err(SnapshotError::DevicesNotAnObject(json_type(&other))),
            None => Err(SnapshotError::DevicesNotAnObject("null")),
        }
    }

    /// A snapshot built directly from a band document.
    pub fn from_bands(bands: Map<String, Value>) -> Self {
        Self {
            bands,
            map_info: MapInfo::default(),
        }
    }

    /// Band key → raw node list, in document order.
    pub fn bands(&self) -> &Map<String, Value> {
        &self.bands
    }

    pub fn map_info(&self) -> &MapInfo {
        &self.map_info
    }

    /// Number of raw records across every band that holds an array.
    pub fn record_count(&self) -> usize {
        self.bands
            .values()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .sum()
    }
}

fn read_map_info(info: &Map<String, Value>) -> MapInfo {
    let local_node = info
        .get("localnode")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    MapInfo {
        local_node,
        kilometers: coerce_flag(info.get("kilometers")).ok(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_band_document() {
        let snapshot = Snapshot::from_json_str(r#"{"2ghz": [{"node": "a"}], "5ghz": []}"#).unwrap();
        let keys: Vec<&str> = snapshot.bands().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2ghz", "5ghz"]);
        assert_eq!(snapshot.map_info(), &MapInfo::default());
        assert_eq!(snapshot.record_count(), 1);
    }

    #[test]
    fn test_envelope() {
        let snapshot = Snapshot::from_value(json!({
            "mapInfo": {"localnode": "KG6WXC-HOME", "kilometers": 1},
            "pollingInfo": {"nodeInfo": 12},
            "allDevices": {"noRF": [], "supernode": []}
        }))
        .unwrap();
        assert_eq!(snapshot.map_info().local_node.as_deref(), Some("KG6WXC-HOME"));
        assert_eq!(snapshot.map_info().kilometers, Some(true));
        assert_eq!(snapshot.bands().len(), 2);
    }

    #[test]
    fn test_envelope_without_map_info() {
        let snapshot = Snapshot::from_value(json!({"allDevices": {"2ghz": []}})).unwrap();
        assert_eq!(snapshot.map_info().local_node, None);
        assert_eq!(snapshot.map_info().kilometers, None);
    }

    #[test]
    fn test_rejects_non_object_documents() {
        assert!(matches!(
            Snapshot::from_json_str("[1, 2]"),
            Err(SnapshotError::NotAnObject("an array"))
        ));
        assert!(matches!(
            Snapshot::from_value(json!({"allDevices": "none"})),
            Err(SnapshotError::DevicesNotAnObject("a string"))
        ));
        assert!(matches!(
            Snapshot::from_json_str("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }
}
