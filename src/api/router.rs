//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! JSON endpoints live under `/api/`; signed file serving under `/files/`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the full application router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/companies",
            post(endpoints::companies::create).get(endpoints::companies::list),
        )
        .route("/companies/:id", get(endpoints::companies::detail))
        .route("/companies/:id/uploads", get(endpoints::companies::uploads))
        .route(
            "/documents",
            post(endpoints::documents::create).get(endpoints::documents::list),
        )
        .route("/documents/:id", get(endpoints::documents::detail))
        .route("/uploads", post(endpoints::uploads::create))
        .route("/uploads/:id", get(endpoints::uploads::detail))
        .route("/uploads/:id/url", get(endpoints::uploads::signed_url))
        .route("/uploads/:id/fields", put(endpoints::uploads::update_fields))
        .with_state(ctx.clone());

    let files = Router::new()
        .route("/files/*path", get(endpoints::files::serve))
        .with_state(ctx);

    Router::new().nest("/api", api).merge(files)
}
