//! Non-fatal problems found while aggregating a snapshot.
//!
//! Nothing found in a snapshot aborts a pass. Problems are collected as
//! [`Issue`]s and handed back next to the topology so the caller can decide
//! how to surface them.

use serde::Serialize;
use thiserror::Error;

/// What went wrong with a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// A required attribute is absent. The record was dropped.
    #[error("missing required field `{field}`, record dropped")]
    MissingField { field: String },

    /// A value could not be coerced. The "unknown" sentinel was substituted
    /// and the record kept, unless the record itself was unusable.
    #[error("malformed value {raw} in field `{field}`")]
    MalformedValue { field: String, raw: String },

    /// A band key outside the known table. Its nodes were kept unclassified.
    #[error("unknown band `{key}`, nodes kept unclassified")]
    UnknownCategory { key: String },
}

impl IssueKind {
    /// Short name used as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingField { .. } => "missing_field",
            IssueKind::MalformedValue { .. } => "malformed_value",
            IssueKind::UnknownCategory { .. } => "unknown_category",
        }
    }
}

/// A problem tied to where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{band}/{record}: {kind}")]
pub struct Issue {
    /// Band key the record was listed under.
    pub band: String,
    /// Hostname of the record, or `#<index>` when it has none.
    pub record: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl Issue {
    pub fn new(band: impl Into<String>, record: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            band: band.into(),
            record: record.into(),
            kind,
        }
    }

    pub fn missing(band: &str, record: &str, field: &str) -> Self {
        Self::new(
            band,
            record,
            IssueKind::MissingField {
                field: field.to_string(),
            },
        )
    }

    pub fn malformed(band: &str, record: &str, field: &str, raw: &serde_json::Value) -> Self {
        Self::new(
            band,
            record,
            IssueKind::MalformedValue {
                field: field.to_string(),
                raw: raw.to_string(),
            },
        )
    }

    pub fn unknown_band(band: &str) -> Self {
        Self::new(
            band,
            "*",
            IssueKind::UnknownCategory {
                key: band.to_string(),
            },
        )
    }
}
