//! Upload endpoints — file intake, extraction, and field reconciliation.
//!
//! `POST /api/uploads` receives the file as base64 JSON, stores it in the
//! bucket, and runs the extraction pipeline before answering; the response
//! carries the extracted values (or `failed` status) so the client can move
//! straight into review. `PUT /api/uploads/:id/fields` is the review
//! counterpart: edited values are diffed against the extraction snapshot and
//! a non-empty diff must be explicitly confirmed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{
    get_document, get_upload, insert_upload, update_last_extracted_details, update_upload_details,
    update_upload_status,
};
use crate::extraction::{extract_with_retry, FilePart};
use crate::extraction::validate_extracted;
use crate::models::{DocumentDefinition, ExtractedDetails, UploadRecord, UploadStatus};
use crate::review::{ReviewError, ReviewSession, ReviewState};
use crate::storage::sniff_kind;

/// Maximum upload size in bytes (10 MB).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize)]
pub struct UploadRequest {
    pub company_id: Uuid,
    pub document_id: Uuid,
    pub file_name: String,
    /// Base64 file content; a data URL prefix is tolerated.
    pub data: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpdateFieldsRequest {
    pub values: ExtractedDetails,
    /// Must be `true` when `values` differ from the extraction snapshot.
    #[serde(default)]
    pub confirm_changes: bool,
}

#[derive(Serialize)]
pub struct SignedUrlResponse {
    pub url: String,
    pub expires: u64,
}

/// `POST /api/uploads` — store a document file and extract its fields.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<UploadRecord>, ApiError> {
    let bytes = decode_base64_payload(&payload.data)
        .map_err(|e| ApiError::BadRequest(format!("Invalid file data: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("File data is empty".into()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::BadRequest(format!(
            "File exceeds 10 MB limit ({} bytes)",
            bytes.len()
        )));
    }

    // Validate references and stage the record before extraction starts.
    let (upload_id, document, file_path) = {
        let conn = ctx.lock_db()?;
        if crate::db::repository::get_company(&conn, &payload.company_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "company {}",
                payload.company_id
            )));
        }
        let document = get_document(&conn, &payload.document_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("document {}", payload.document_id))
        })?;

        let file_path = ctx.storage.store(
            &payload.company_id,
            &payload.document_id,
            &payload.file_name,
            &bytes,
        )?;

        let upload = UploadRecord {
            id: Uuid::new_v4(),
            document_id: payload.document_id,
            company_id: payload.company_id,
            file_name: payload.file_name.clone(),
            file_path: file_path.clone(),
            issue_date: payload.issue_date,
            expiry_date: payload.expiry_date,
            status: UploadStatus::Uploaded,
            extracted_details: None,
            uploaded_at: chrono::Utc::now().naive_utc(),
        };
        // The file lands before the record; remove it again if the insert
        // fails so the bucket holds no orphans.
        if let Err(e) = insert_upload(&conn, &upload) {
            if let Err(del) = ctx.storage.delete(&file_path) {
                tracing::warn!(path = %file_path, error = %del, "Orphaned object cleanup failed");
            }
            return Err(e.into());
        }
        update_upload_status(&conn, &upload.id, UploadStatus::Extracting)?;

        (upload.id, document, file_path)
    };

    let file_part = file_part_for(&ctx, &file_path, &bytes);
    let result = run_extraction(&ctx, file_part, document.clone()).await;

    {
        let conn = ctx.lock_db()?;
        match result {
            Ok(details) => {
                update_upload_details(&conn, &upload_id, &details, UploadStatus::PendingReview)?;
                update_last_extracted_details(&conn, &document.id, &details)?;
                tracing::info!(upload_id = %upload_id, "Upload extracted, pending review");
            }
            Err(e) => {
                tracing::warn!(upload_id = %upload_id, error = %e, "Extraction failed");
                update_upload_status(&conn, &upload_id, UploadStatus::Failed)?;
            }
        }

        get_upload(&conn, &upload_id)?
            .map(Json)
            .ok_or_else(|| ApiError::Internal("upload vanished after insert".into()))
    }
}

/// `GET /api/uploads/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadRecord>, ApiError> {
    let conn = ctx.lock_db()?;
    get_upload(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("upload {id}")))
}

/// `GET /api/uploads/:id/url` — short-lived signed link to the stored file.
pub async fn signed_url(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    let file_path = {
        let conn = ctx.lock_db()?;
        get_upload(&conn, &id)?
            .map(|u| u.file_path)
            .ok_or_else(|| ApiError::NotFound(format!("upload {id}")))?
    };

    let signed = ctx.signer.sign(&file_path);
    Ok(Json(SignedUrlResponse {
        url: format!("{}{}", crate::config::public_base_url(), signed.to_uri()),
        expires: signed.expires,
    }))
}

/// `PUT /api/uploads/:id/fields` — accept reviewed field values.
///
/// Values are diffed against the stored extraction snapshot. Any difference
/// returns `409 UNCONFIRMED_CHANGES` with the per-field diff unless
/// `confirm_changes` is set; an accepted submission marks the upload
/// `confirmed` and refreshes the definition's `last_extracted_details`.
pub async fn update_fields(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFieldsRequest>,
) -> Result<Json<UploadRecord>, ApiError> {
    let conn = ctx.lock_db()?;
    let upload = get_upload(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("upload {id}")))?;
    let document = get_document(&conn, &upload.document_id)?.ok_or_else(|| {
        ApiError::NotFound(format!("document {}", upload.document_id))
    })?;

    let snapshot = upload.extracted_details.clone().unwrap_or_default();
    if snapshot.is_empty() {
        return Err(ApiError::BadRequest(
            "Upload has no extracted values to review".into(),
        ));
    }

    let mut session = ReviewSession::preview(id, snapshot);
    session
        .begin_editing()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    for (field, value) in payload.values {
        session.edit_field(&field, value).map_err(|e| match e {
            ReviewError::UnknownField(name) => {
                ApiError::BadRequest(format!("Unknown field: {name}"))
            }
            other => ApiError::Internal(other.to_string()),
        })?;
    }

    if !validate_extracted(session.working_values(), &document.fields) {
        return Err(ApiError::BadRequest(
            "Submitted values do not match the declared field types".into(),
        ));
    }

    let changes = session
        .begin_save()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if session.state == ReviewState::Confirming {
        if !payload.confirm_changes {
            return Err(ApiError::UnconfirmedChanges(changes));
        }
        session
            .confirm()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
    }

    let accepted = session
        .submitted_values()
        .ok_or_else(|| ApiError::Internal("review session not submitted".into()))?;

    update_upload_details(&conn, &id, accepted, UploadStatus::Confirmed)?;
    update_last_extracted_details(&conn, &document.id, accepted)?;
    tracing::info!(
        upload_id = %id,
        changed = changes.len(),
        "Reviewed fields confirmed"
    );

    get_upload(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("upload {id}")))
}

/// Choose how the stored file travels to the vision model: PDFs inline as a
/// data URL, everything else as a signed link the API can dereference.
fn file_part_for(ctx: &ApiContext, file_path: &str, bytes: &[u8]) -> FilePart {
    if sniff_kind(bytes) == crate::storage::FileKind::Pdf {
        FilePart::InlinePdf {
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    } else {
        let signed = ctx.signer.sign(file_path);
        FilePart::ImageUrl(format!(
            "{}{}",
            crate::config::public_base_url(),
            signed.to_uri()
        ))
    }
}

/// Decode a base64 payload, tolerating a `data:...;base64,` prefix.
fn decode_base64_payload(data: &str) -> Result<Vec<u8>, String> {
    let raw = match data.find(',') {
        Some(idx) if data.starts_with("data:") => &data[idx + 1..],
        _ => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| format!("base64 decode failed: {e}"))
}

/// Run the blocking extraction pipeline off the async runtime.
async fn run_extraction(
    ctx: &ApiContext,
    file: FilePart,
    document: DocumentDefinition,
) -> Result<ExtractedDetails, crate::extraction::ExtractionError> {
    let vision = Arc::clone(&ctx.vision);
    let max_retries = ctx.max_retries;
    tokio::task::spawn_blocking(move || {
        extract_with_retry(vision.as_ref(), &file, &document, max_retries)
    })
    .await
    .map_err(|e| crate::extraction::ExtractionError::Api(format!("extraction task: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain_base64() {
        let raw = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4");
        assert_eq!(decode_base64_payload(&raw).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn decode_data_url_prefix() {
        let raw = format!(
            "data:application/pdf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"hello")
        );
        assert_eq!(decode_base64_payload(&raw).unwrap(), b"hello");
    }

    #[test]
    fn decode_invalid_base64_errors() {
        assert!(decode_base64_payload("!!not base64!!").is_err());
    }
}
