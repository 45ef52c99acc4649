//! Whole-result type-conformance check, used by the retry wrapper to decide
//! whether an extraction attempt is acceptable.

use crate::models::{ExtractedDetails, FieldDefinition, FieldType, FieldValue};

use super::coerce::parse_flexible_date;

/// Validate an extraction result against the declared field types.
///
/// `Null` (or an absent key) always passes — absence is not a validation
/// failure. Date fields must hold a date or date-parseable text; number
/// fields a number or plainly numeric text. Any failure short-circuits the
/// whole result to `false`; there is no field-level granularity.
pub fn validate_extracted(result: &ExtractedDetails, fields: &[FieldDefinition]) -> bool {
    for field in fields {
        let Some(value) = result.get(&field.name) else {
            continue;
        };
        if !value_conforms(value, field.field_type) {
            tracing::debug!(
                field = %field.name,
                expected = field.field_type.as_str(),
                "Extracted value failed type validation"
            );
            return false;
        }
    }
    true
}

fn value_conforms(value: &FieldValue, field_type: FieldType) -> bool {
    match (field_type, value) {
        (_, FieldValue::Null) => true,
        (FieldType::Date, FieldValue::Date(_)) => true,
        (FieldType::Date, FieldValue::Text(s)) => parse_flexible_date(s).is_some(),
        (FieldType::Date, FieldValue::Number(_)) => false,
        (FieldType::Number, FieldValue::Number(n)) => n.is_finite(),
        (FieldType::Number, FieldValue::Text(s)) => s.trim().parse::<f64>().is_ok(),
        (FieldType::Number, FieldValue::Date(_)) => false,
        // Text-like fields accept anything the coercion produced
        (FieldType::Text | FieldType::Email | FieldType::Phone, _) => true,
    }
}
