//! Bounded retry around the extraction pass.
//!
//! First attempt whose result validates against the declared field types
//! wins. Linear backoff between attempts: 1s after the first failure, 2s
//! after the second, and so on.

use std::time::Duration;

use crate::models::{DocumentDefinition, ExtractedDetails};

use super::client::{FilePart, VisionClient};
use super::{perform_extraction, validate_extracted, ExtractionError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Run extraction up to `max_retries` times, returning the first result
/// that validates.
///
/// On exhaustion the last transport/parse error is rethrown; `Exhausted`
/// covers runs where every attempt returned a non-validating result
/// without ever erroring.
pub fn extract_with_retry(
    client: &dyn VisionClient,
    file: &FilePart,
    document: &DocumentDefinition,
    max_retries: u32,
) -> Result<ExtractedDetails, ExtractionError> {
    retry_validating(
        max_retries,
        || perform_extraction(client, file, document),
        |details| validate_extracted(details, &document.fields),
    )
}

/// Attempt loop: first result passing `accept` wins.
///
/// With the standard pipeline, coercion turns unreadable values into `Null`
/// before this gate, so `accept` only rejects values that arrive typed but
/// wrong. A rejected result does not clear a previously recorded error —
/// on exhaustion the last error encountered is what the caller sees.
fn retry_validating<T>(
    max_retries: u32,
    mut attempt: impl FnMut() -> Result<T, ExtractionError>,
    accept: impl Fn(&T) -> bool,
) -> Result<T, ExtractionError> {
    let max_retries = max_retries.max(1);
    let mut last_error: Option<ExtractionError> = None;

    for n in 1..=max_retries {
        match attempt() {
            Ok(value) if accept(&value) => {
                if n > 1 {
                    tracing::info!(attempt = n, "Extraction succeeded after retry");
                }
                return Ok(value);
            }
            Ok(_) => {
                tracing::warn!(attempt = n, "Extraction result failed validation");
            }
            Err(e) => {
                tracing::warn!(attempt = n, error = %e, "Extraction attempt failed");
                last_error = Some(e);
            }
        }

        if n < max_retries {
            std::thread::sleep(Duration::from_millis(1000 * u64::from(n)));
        }
    }

    Err(last_error.unwrap_or(ExtractionError::Exhausted {
        attempts: max_retries,
    }))
}
