use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::UploadStatus;
use super::value::ExtractedDetails;

/// One uploaded file instance against a document definition.
///
/// Lifecycle: created on upload → extraction attempted (bounded retries) →
/// reviewed/edited → confirmed. `extracted_details` holds the merged result
/// of extraction plus any confirmed user edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub company_id: Uuid,
    /// Bucket-relative path: `{company_id}/{document_id}/{file_name}`.
    pub file_path: String,
    pub file_name: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: UploadStatus,
    pub extracted_details: Option<ExtractedDetails>,
    pub uploaded_at: NaiveDateTime,
}
