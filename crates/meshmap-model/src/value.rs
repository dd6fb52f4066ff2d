//! Lenient extraction of typed values from raw JSON records.
//!
//! This module provides:
//! - [`Coerced`] - The outcome of coercing one raw value
//! - [`coerce_number`], [`coerce_text`], [`coerce_flag`] - Stateless coercions
//! - [`FieldReader`] - Reads fields out of one record, reporting malformed values

use crate::issue::Issue;
use serde_json::{Map, Value};

/// Strings the polling backend writes in place of a missing value.
const ABSENT_MARKERS: &[&str] = &["", "none", "not available", "n/a", "null", "undefined"];

// ============================================================================
// Coercion
// ============================================================================

/// Outcome of coercing one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    /// The value was usable.
    Value(T),
    /// The value was missing, null, or an "absent" marker string.
    Absent,
    /// The value was present but could not be coerced.
    Malformed,
}

impl<T> Coerced<T> {
    /// Convert to an option, treating malformed values as unknown.
    pub fn ok(self) -> Option<T> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Absent | Coerced::Malformed => None,
        }
    }
}

fn is_absent_marker(s: &str) -> bool {
    let s = s.trim();
    ABSENT_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m))
}

/// Coerce a JSON number or numeric string to `f64`.
pub fn coerce_number(value: Option<&Value>) -> Coerced<f64> {
    match value {
        None | Some(Value::Null) => Coerced::Absent,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Coerced::Value(v),
            _ => Coerced::Malformed,
        },
        Some(Value::String(s)) if is_absent_marker(s) => Coerced::Absent,
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Coerced::Value(v),
            _ => Coerced::Malformed,
        },
        Some(_) => Coerced::Malformed,
    }
}

/// Coerce a JSON scalar to display text.
///
/// Numbers and booleans are stringified; arrays and objects are malformed.
pub fn coerce_text(value: Option<&Value>) -> Coerced<String> {
    match value {
        None | Some(Value::Null) => Coerced::Absent,
        Some(Value::String(s)) if is_absent_marker(s) => Coerced::Absent,
        Some(Value::String(s)) => Coerced::Value(s.trim().to_string()),
        Some(Value::Number(n)) => Coerced::Value(n.to_string()),
        Some(Value::Bool(b)) => Coerced::Value(b.to_string()),
        Some(_) => Coerced::Malformed,
    }
}

/// Coerce the backend's assorted truthy encodings (`1`, `"1"`, `true`, `"true"`).
pub fn coerce_flag(value: Option<&Value>) -> Coerced<bool> {
    match value {
        None | Some(Value::Null) => Coerced::Absent,
        Some(Value::Bool(b)) => Coerced::Value(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Coerced::Value(false),
            Some(1) => Coerced::Value(true),
            _ => Coerced::Malformed,
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Coerced::Value(true),
            "0" | "false" | "off" | "no" => Coerced::Value(false),
            other if is_absent_marker(other) => Coerced::Absent,
            _ => Coerced::Malformed,
        },
        Some(_) => Coerced::Malformed,
    }
}

// ============================================================================
// Field Reader
// ============================================================================

/// Reads typed fields out of one JSON object, reporting malformed values.
///
/// Every `Malformed` outcome becomes an [`Issue`] pushed to the shared sink,
/// and the caller receives `None` in its place.
pub struct FieldReader<'a> {
    fields: &'a Map<String, Value>,
    band: &'a str,
    record: String,
    prefix: String,
    issues: &'a mut Vec<Issue>,
}

impl<'a> FieldReader<'a> {
    pub fn new(
        fields: &'a Map<String, Value>,
        band: &'a str,
        record: impl Into<String>,
        issues: &'a mut Vec<Issue>,
    ) -> Self {
        Self {
            fields,
            band,
            record: record.into(),
            prefix: String::new(),
            issues,
        }
    }

    /// Prefix reported field names (e.g. `link_info.10.0.0.1`).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Update the record label once the hostname is known.
    pub fn set_record(&mut self, record: impl Into<String>) {
        self.record = record.into();
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn band(&self) -> &str {
        self.band
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key)
    }

    fn field_name(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.prefix, key)
        }
    }

    /// Push an issue against this record.
    pub fn report(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    fn resolve<T>(&mut self, key: &str, coerced: Coerced<T>) -> Option<T> {
        match coerced {
            Coerced::Value(v) => Some(v),
            Coerced::Absent => None,
            Coerced::Malformed => {
                let raw = self.fields.get(key).cloned().unwrap_or(Value::Null);
                tracing::debug!(
                    band = self.band,
                    record = %self.record,
                    field = key,
                    "malformed value {}, using unknown",
                    raw
                );
                let field = self.field_name(key);
                let issue = Issue::malformed(self.band, &self.record, &field, &raw);
                self.issues.push(issue);
                None
            }
        }
    }

    pub fn number(&mut self, key: &str) -> Option<f64> {
        let coerced = coerce_number(self.fields.get(key));
        self.resolve(key, coerced)
    }

    /// First present key wins; later keys are aliases.
    pub fn number_any(&mut self, keys: &[&str]) -> Option<f64> {
        let key = keys.iter().find(|k| self.fields.contains_key(**k))?;
        self.number(key)
    }

    pub fn text(&mut self, key: &str) -> Option<String> {
        let coerced = coerce_text(self.fields.get(key));
        self.resolve(key, coerced)
    }

    pub fn text_any(&mut self, keys: &[&str]) -> Option<String> {
        let key = keys.iter().find(|k| self.fields.contains_key(**k))?;
        self.text(key)
    }

    pub fn flag(&mut self, key: &str) -> Option<bool> {
        let coerced = coerce_flag(self.fields.get(key));
        self.resolve(key, coerced)
    }

    /// A whole number, rejecting negative and fractional values.
    pub fn count(&mut self, key: &str) -> Option<u32> {
        let coerced = match coerce_number(self.fields.get(key)) {
            Coerced::Value(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => {
                Coerced::Value(v as u32)
            }
            Coerced::Value(_) | Coerced::Malformed => Coerced::Malformed,
            Coerced::Absent => Coerced::Absent,
        };
        self.resolve(key, coerced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&json!(12.5))), Coerced::Value(12.5));
        assert_eq!(coerce_number(Some(&json!(" 7 "))), Coerced::Value(7.0));
        assert_eq!(coerce_number(Some(&json!("Not Available"))), Coerced::Absent);
        assert_eq!(coerce_number(Some(&json!(""))), Coerced::Absent);
        assert_eq!(coerce_number(None), Coerced::Absent);
        assert_eq!(coerce_number(Some(&json!("fast"))), Coerced::Malformed);
        assert_eq!(coerce_number(Some(&json!([1, 2]))), Coerced::Malformed);
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text(Some(&json!(" ssid "))), Coerced::Value("ssid".to_string()));
        assert_eq!(coerce_text(Some(&json!(149))), Coerced::Value("149".to_string()));
        assert_eq!(coerce_text(Some(&json!("None"))), Coerced::Absent);
        assert_eq!(coerce_text(Some(&json!({"a": 1}))), Coerced::Malformed);
    }

    #[test]
    fn test_coerce_flag() {
        assert_eq!(coerce_flag(Some(&json!(1))), Coerced::Value(true));
        assert_eq!(coerce_flag(Some(&json!("true"))), Coerced::Value(true));
        assert_eq!(coerce_flag(Some(&json!("off"))), Coerced::Value(false));
        assert_eq!(coerce_flag(Some(&json!(7))), Coerced::Malformed);
    }

    #[test]
    fn test_reader_reports_malformed() {
        let record = json!({"antGain": "lots", "antBeam": 45, "hopsAway": -1});
        let fields = record.as_object().unwrap();
        let mut issues = Vec::new();
        let mut reader = FieldReader::new(fields, "5ghz", "alpha", &mut issues);

        assert_eq!(reader.number("antGain"), None);
        assert_eq!(reader.number("antBeam"), Some(45.0));
        assert_eq!(reader.count("hopsAway"), None);
        assert_eq!(reader.number("missing"), None);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].record, "alpha");
    }

    #[test]
    fn test_reader_prefix_and_aliases() {
        let record = json!({"quality": "x"});
        let fields = record.as_object().unwrap();
        let mut issues = Vec::new();
        let mut reader =
            FieldReader::new(fields, "2ghz", "alpha", &mut issues).with_prefix("link_info.10.0.0.2");

        assert_eq!(reader.number_any(&["qual", "quality"]), None);
        assert_eq!(
            issues[0].kind,
            crate::IssueKind::MalformedValue {
                field: "link_info.10.0.0.2.quality".to_string(),
                raw: "\"x\"".to_string(),
            }
        );
    }
}
