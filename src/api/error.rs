//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::review::FieldChange;
use crate::storage::StorageError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
    /// Field-level diff, present only on `UNCONFIRMED_CHANGES` responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Changes require confirmation")]
    UnconfirmedChanges(Vec<FieldChange>),
    #[error("Signed URL expired")]
    UrlExpired,
    #[error("Signature invalid")]
    SignatureInvalid,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut changes = None;
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::UnconfirmedChanges(diff) => {
                let summary = diff
                    .iter()
                    .map(|c| format!("{} ({} -> {})", c.field, c.original.display(), c.new.display()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = format!(
                    "Values differ from the extracted snapshot: {summary}; resubmit with \"confirm_changes\": true"
                );
                changes = Some(diff);
                (StatusCode::CONFLICT, "UNCONFIRMED_CHANGES", message)
            }
            ApiError::UrlExpired => (
                StatusCode::GONE,
                "URL_EXPIRED",
                "Signed URL has expired, request a new one".to_string(),
            ),
            ApiError::SignatureInvalid => (
                StatusCode::FORBIDDEN,
                "SIGNATURE_INVALID",
                "Signed URL signature does not match".to_string(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
            changes,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => ApiError::NotFound(format!("object {path}")),
            StorageError::InvalidPath(path) => ApiError::BadRequest(format!("invalid path: {path}")),
            StorageError::UrlExpired => ApiError::UrlExpired,
            StorageError::SignatureMismatch => ApiError::SignatureInvalid,
            StorageError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}
