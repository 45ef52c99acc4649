//! Signed file serving — the `/files/*path` route.
//!
//! Objects in the bucket are private; the only way to read one over HTTP is
//! a link signed by `UrlSigner`. Expiry is rejected with 410 and a bad
//! signature with 403 before the filesystem is touched.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::storage::sniff_kind;

#[derive(Deserialize)]
pub struct SignedQuery {
    pub expires: u64,
    pub sig: String,
}

/// `GET /files/*path?expires=...&sig=...`
pub async fn serve(
    State(ctx): State<ApiContext>,
    Path(path): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    ctx.signer.verify(&path, query.expires, &query.sig)?;
    let bytes = ctx.storage.read(&path)?;

    // Prefer the file name's extension; fall back to magic bytes.
    let mime = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or_else(|| sniff_kind(&bytes).mime());

    tracing::debug!(path = %path, size = bytes.len(), "Serving signed file");
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}
