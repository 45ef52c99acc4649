//! Company endpoints — the entities KYC documents are collected for.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{get_company, insert_company, list_companies, list_uploads_for_company};
use crate::models::{Company, UploadRecord};

#[derive(Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub registration_number: Option<String>,
}

/// `POST /api/companies` — register a company.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<Json<Company>, ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Company name is required".into()));
    }

    let company = Company {
        id: Uuid::new_v4(),
        name,
        registration_number: payload.registration_number,
        created_at: chrono::Utc::now().naive_utc(),
    };

    let conn = ctx.lock_db()?;
    insert_company(&conn, &company)?;
    tracing::info!(company_id = %company.id, name = %company.name, "Company registered");

    Ok(Json(company))
}

/// `GET /api/companies` — all companies, sorted by name.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Company>>, ApiError> {
    let conn = ctx.lock_db()?;
    Ok(Json(list_companies(&conn)?))
}

/// `GET /api/companies/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    let conn = ctx.lock_db()?;
    get_company(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("company {id}")))
}

/// `GET /api/companies/:id/uploads` — a company's document uploads, newest
/// first.
pub async fn uploads(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UploadRecord>>, ApiError> {
    let conn = ctx.lock_db()?;
    if get_company(&conn, &id)?.is_none() {
        return Err(ApiError::NotFound(format!("company {id}")));
    }
    Ok(Json(list_uploads_for_company(&conn, &id)?))
}
