//! Best-effort coercion of raw extracted strings into typed values.
//!
//! Coercion never errors: anything that cannot be read as the declared type
//! becomes `Null`. Scanned documents carry currency prefixes, thousands
//! separators, and free-form dates, so number and date parsing are
//! deliberately loose.

use chrono::NaiveDate;

use crate::models::{FieldType, FieldValue};

/// Coerce a raw string onto a field's declared type.
pub fn coerce_value(raw: &str, field_type: FieldType) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return FieldValue::Null;
    }

    match field_type {
        FieldType::Date => parse_flexible_date(trimmed)
            .map(FieldValue::Date)
            .unwrap_or(FieldValue::Null),
        FieldType::Number => parse_loose_number(trimmed)
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Null),
        FieldType::Text | FieldType::Email | FieldType::Phone => {
            FieldValue::Text(trimmed.to_string())
        }
    }
}

/// Date formats seen in scanned registry/tax documents, tried in order.
/// Day-first before month-first: the source documents are predominantly
/// DD/MM/YYYY jurisdictions.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Parse a date from any of the supported formats, ISO timestamps included.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // ISO timestamp: take the date part. `get` rather than a slice — byte
    // 10 may fall inside a multibyte character on non-ASCII input.
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }

    None
}

/// Parse a number out of a string that may carry currency symbols,
/// grouping commas, or surrounding text ("KES 1,200.50" → 1200.50).
pub fn parse_loose_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}
