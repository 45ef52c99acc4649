//! Vision-model field extraction pipeline.
//!
//! A stored file plus a document definition go in; a typed
//! `field name → value` map comes out. The flow is linear:
//! prompt build → chat-completion call → response parse → key mapping +
//! type coercion. Validation and bounded retry sit on top (`validate`,
//! `retry`); the upload endpoint always extracts through the retry wrapper.

pub mod client;
pub mod coerce;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod validate;

pub use client::{FilePart, HyperbolicClient, VisionClient};
pub use retry::extract_with_retry;
pub use validate::validate_extracted;

use thiserror::Error;

use crate::models::{DocumentDefinition, ExtractedDetails, FieldValue};

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction API not configured: {0}")]
    NotConfigured(String),

    #[error("Extraction request failed: {0}")]
    Api(String),

    #[error("Extraction API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Failed to parse extraction response: {0}")]
    MalformedResponse(String),

    #[error("Extraction exhausted {attempts} attempts without a valid result")]
    Exhausted { attempts: u32 },
}

/// Run a single extraction pass: call the model and map its output onto the
/// definition's declared fields.
///
/// Every declared field appears in the result; fields the model did not
/// produce (or whose values failed coercion) are `Null`. Keys the model
/// invented are discarded. No partial-result semantics — any transport or
/// parse failure fails the whole call.
pub fn perform_extraction(
    client: &dyn VisionClient,
    file: &FilePart,
    document: &DocumentDefinition,
) -> Result<ExtractedDetails, ExtractionError> {
    let _span = tracing::info_span!(
        "perform_extraction",
        document = %document.name,
        fields = document.fields.len(),
    )
    .entered();
    let start = std::time::Instant::now();

    let prompt = prompt::build_prompt(document);
    let raw = client.complete(&prompt, file)?;
    let parsed = parser::parse_extraction_response(&raw)?;

    let mut details = ExtractedDetails::new();
    for field in &document.fields {
        let raw_value = parsed
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(&field.name))
            .map(|(_, v)| v.as_str());
        let value = match raw_value {
            Some(raw) => coerce::coerce_value(raw, field.field_type),
            None => FieldValue::Null,
        };
        details.insert(field.name.clone(), value);
    }

    let resolved = details.values().filter(|v| !v.is_null()).count();
    tracing::info!(
        elapsed_ms = %start.elapsed().as_millis(),
        resolved,
        declared = document.fields.len(),
        "Extraction pass complete"
    );

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::client::MockVisionClient;
    use super::*;
    use crate::models::{FieldDefinition, FieldType};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn definition(fields: &[(&str, FieldType)]) -> DocumentDefinition {
        DocumentDefinition {
            id: Uuid::new_v4(),
            name: "Petty Cash Voucher".into(),
            fields: fields
                .iter()
                .map(|(name, ft)| FieldDefinition {
                    id: Uuid::new_v4(),
                    name: (*name).to_string(),
                    field_type: *ft,
                })
                .collect(),
            last_extracted_details: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn image() -> FilePart {
        FilePart::ImageUrl("https://example.test/files/x.png".into())
    }

    #[test]
    fn currency_number_and_long_date_coerced() {
        let doc = definition(&[("amount", FieldType::Number), ("issued", FieldType::Date)]);
        let client = MockVisionClient::new("amount: KES 1,200.50\nissued: 12 March 2024");

        let details = perform_extraction(&client, &image(), &doc).unwrap();
        assert_eq!(details.get("amount"), Some(&FieldValue::Number(1200.50)));
        assert_eq!(
            details.get("issued"),
            Some(&FieldValue::Date(
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
            ))
        );
    }

    #[test]
    fn unstructured_response_resolves_all_fields_to_null() {
        let doc = definition(&[("amount", FieldType::Number), ("issued", FieldType::Date)]);
        let client = MockVisionClient::new("I could not read the document, sorry.");

        let details = perform_extraction(&client, &image(), &doc).unwrap();
        assert_eq!(details.len(), 2);
        assert!(details.values().all(FieldValue::is_null));
    }

    #[test]
    fn unrecognized_keys_discarded() {
        let doc = definition(&[("permit_no", FieldType::Text)]);
        let client = MockVisionClient::new(
            r#"{"permit_no": "BP-9981", "hallucinated": "value", "another": 7}"#,
        );

        let details = perform_extraction(&client, &image(), &doc).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(
            details.get("permit_no"),
            Some(&FieldValue::Text("BP-9981".into()))
        );
    }

    #[test]
    fn key_matching_is_case_insensitive() {
        let doc = definition(&[("Registration Number", FieldType::Text)]);
        let client = MockVisionClient::new(r#"{"registration number": "PVT-001"}"#);

        let details = perform_extraction(&client, &image(), &doc).unwrap();
        assert_eq!(
            details.get("Registration Number"),
            Some(&FieldValue::Text("PVT-001".into()))
        );
    }

    #[test]
    fn invalid_json_block_is_malformed_response() {
        let doc = definition(&[("amount", FieldType::Number)]);
        let client = MockVisionClient::new("```json\n{invalid json}\n```");

        let err = perform_extraction(&client, &image(), &doc).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedResponse(_)));
    }

    #[test]
    fn transport_error_propagates() {
        let doc = definition(&[("amount", FieldType::Number)]);
        let client = MockVisionClient::failing();

        let err = perform_extraction(&client, &image(), &doc).unwrap_err();
        assert!(matches!(err, ExtractionError::Api(_)));
    }
}
