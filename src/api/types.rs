//! Shared state for the HTTP API layer.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::extraction::retry::DEFAULT_MAX_RETRIES;
use crate::extraction::VisionClient;
use crate::storage::{StorageGateway, UrlSigner};

/// Shared context for all API routes.
///
/// SQLite connections are not `Sync`, so the single connection lives behind
/// a mutex; handlers hold it only for the duration of a query, never across
/// an await point.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub storage: Arc<StorageGateway>,
    pub signer: Arc<UrlSigner>,
    pub vision: Arc<dyn VisionClient>,
    pub max_retries: u32,
}

impl ApiContext {
    pub fn new(
        conn: Connection,
        storage: StorageGateway,
        vision: Arc<dyn VisionClient>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            storage: Arc::new(storage),
            signer: Arc::new(UrlSigner::new_random()),
            vision,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Lock the database connection, mapping a poisoned lock to an API error.
    pub fn lock_db(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
