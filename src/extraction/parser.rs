//! Parse the model's free-text reply into a raw key → string map.
//!
//! JSON-object-first: if the reply contains something that looks like a
//! JSON object, it must parse — a half-formed object is a malformed
//! response, not a silent miss. With no JSON at all, fall back to naive
//! `key: value` line splitting. A reply with neither parses to an empty
//! map (downstream, every declared field then resolves to null).

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

use super::ExtractionError;

/// Raw parsed output before key mapping and coercion.
pub type RawFields = BTreeMap<String, String>;

pub fn parse_extraction_response(response: &str) -> Result<RawFields, ExtractionError> {
    if let Some(json_str) = locate_json_object(response) {
        return parse_json_object(json_str);
    }
    Ok(parse_key_value_lines(response))
}

/// Find the outermost `{ ... }` span, if any.
fn locate_json_object(response: &str) -> Option<&str> {
    // Greedy: first '{' to last '}' — tolerates markdown fences around it.
    let re = Regex::new(r"(?s)\{.*\}").expect("static regex");
    re.find(response).map(|m| m.as_str())
}

fn parse_json_object(json_str: &str) -> Result<RawFields, ExtractionError> {
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    let object = value.as_object().ok_or_else(|| {
        ExtractionError::MalformedResponse("JSON payload is not an object".into())
    })?;

    let mut fields = RawFields::new();
    for (key, val) in object {
        let raw = match val {
            Value::Null => continue, // absent; resolves to Null downstream
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            // Nested structures are flattened to their JSON text; coercion
            // will turn them into Null for typed fields.
            other => other.to_string(),
        };
        fields.insert(key.clone(), raw);
    }
    Ok(fields)
}

/// Fallback: split `key: value` lines.
fn parse_key_value_lines(response: &str) -> RawFields {
    let mut fields = RawFields::new();
    for line in response.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_start_matches(['-', '*', ' ']).trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        fields.insert(key.to_string(), value.to_string());
    }
    fields
}
