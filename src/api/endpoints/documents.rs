//! Document definition endpoints.
//!
//! A definition names a compliance document and declares the typed fields
//! extraction should produce for it. Definitions are create-and-read; the
//! only mutation is the `last_extracted_details` mirror written by the
//! upload flow.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{get_document, insert_document, list_documents};
use crate::models::{DocumentDefinition, FieldDefinition, FieldType};

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub fields: Vec<CreateFieldRequest>,
}

#[derive(Deserialize)]
pub struct CreateFieldRequest {
    pub name: String,
    pub field_type: FieldType,
}

/// `POST /api/documents` — define a document type and its fields.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentDefinition>, ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Document name is required".into()));
    }
    if payload.fields.is_empty() {
        return Err(ApiError::BadRequest(
            "A document needs at least one field".into(),
        ));
    }

    let mut fields = Vec::with_capacity(payload.fields.len());
    for field in payload.fields {
        let field_name = field.name.trim().to_string();
        if field_name.is_empty() {
            return Err(ApiError::BadRequest("Field names must be non-empty".into()));
        }
        if fields
            .iter()
            .any(|f: &FieldDefinition| f.name.eq_ignore_ascii_case(&field_name))
        {
            return Err(ApiError::BadRequest(format!(
                "Duplicate field name: {field_name}"
            )));
        }
        fields.push(FieldDefinition {
            id: Uuid::new_v4(),
            name: field_name,
            field_type: field.field_type,
        });
    }

    let document = DocumentDefinition {
        id: Uuid::new_v4(),
        name,
        fields,
        last_extracted_details: None,
        created_at: chrono::Utc::now().naive_utc(),
    };

    let conn = ctx.lock_db()?;
    insert_document(&conn, &document)?;
    tracing::info!(
        document_id = %document.id,
        name = %document.name,
        fields = document.fields.len(),
        "Document definition created"
    );

    Ok(Json(document))
}

/// `GET /api/documents` — all definitions, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<DocumentDefinition>>, ApiError> {
    let conn = ctx.lock_db()?;
    Ok(Json(list_documents(&conn)?))
}

/// `GET /api/documents/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentDefinition>, ApiError> {
    let conn = ctx.lock_db()?;
    get_document(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("document {id}")))
}
