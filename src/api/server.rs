//! API server lifecycle — binds, serves, and shuts down the axum app.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
#[derive(Debug)]
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind `bind_addr` and serve the API in a background task.
pub async fn start_server(ctx: ApiContext, bind_addr: &str) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("Failed to bind {bind_addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::db::sqlite::open_memory_database;
    use crate::extraction::client::MockVisionClient;
    use crate::storage::StorageGateway;

    fn test_ctx(tmp: &tempfile::TempDir) -> ApiContext {
        ApiContext::new(
            open_memory_database().unwrap(),
            StorageGateway::new(tmp.path().to_path_buf()),
            Arc::new(MockVisionClient::new("{}")),
        )
    }

    #[tokio::test]
    async fn start_serves_health_and_stops() {
        let tmp = tempfile::tempdir().unwrap();
        // Port 0 for an ephemeral port
        let mut server = start_server(test_ctx(&tmp), "127.0.0.1:0")
            .await
            .expect("server should start");
        assert!(server.addr.port() > 0);

        let url = format!("http://{}/api/health", server.addr);
        let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(body.contains("\"ok\""));

        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut server = start_server(test_ctx(&tmp), "127.0.0.1:0")
            .await
            .expect("server should start");
        server.shutdown();
        server.shutdown();
    }

    #[tokio::test]
    async fn bind_failure_reports_address() {
        let err = start_server(
            test_ctx(&tempfile::tempdir().unwrap()),
            "256.0.0.1:0",
        )
        .await
        .unwrap_err();
        assert!(err.contains("Failed to bind 256.0.0.1:0"));
    }
}
