//! Typed extracted values.
//!
//! Extraction results are `field name → FieldValue` maps. Values are coerced
//! to the owning field's declared type at parse time; coercion failures
//! become `Null` rather than errors (absence is not a failure).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single extracted field value, typed per the field definition.
///
/// Serializes as a bare JSON scalar: `null`, number, `"YYYY-MM-DD"`, or string.
/// Variant order matters for untagged deserialization: ISO date strings
/// resolve to `Date` before falling back to `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Human-readable form, used for change summaries in the review flow.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Number(n) => {
                // Render integers without a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

/// Extracted details for an upload: declared field name → typed value.
///
/// Keys are always a subset of the owning document definition's field names.
/// BTreeMap keeps the persisted JSON stable across runs.
pub type ExtractedDetails = BTreeMap<String, FieldValue>;
