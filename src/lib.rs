//! KYC document vault — storage, AI field extraction, and review for
//! business compliance documents.
//!
//! Companies upload scanned compliance documents (permits, certificates,
//! tax clearances); a vision model extracts the fields each document type
//! declares; a back-office reviewer reconciles and confirms the values.
//! Everything is served over a local HTTP API backed by SQLite and a
//! filesystem object bucket.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod extraction;
pub mod models;
pub mod review;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Open the data directory, database, and storage bucket, then serve the
/// API until interrupted.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(config::storage_dir())?;
    tracing::info!(path = %data_dir.display(), "Data directory ready");

    let conn = db::sqlite::open_database(&config::database_path())?;
    let storage = storage::StorageGateway::new(config::storage_dir());
    let vision: Arc<dyn extraction::VisionClient> =
        Arc::new(extraction::HyperbolicClient::from_config());

    let ctx = api::ApiContext::new(conn, storage, vision);
    let mut server = api::start_server(ctx, &config::bind_addr()).await?;
    tracing::info!(addr = %server.addr, "KycVault listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");
    server.shutdown();
    Ok(())
}
