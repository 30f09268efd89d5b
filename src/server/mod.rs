//! HTTP trigger endpoints.
//!
//! Provides four endpoints:
//! - `POST /leads/{id}/audit` - synchronous audit, returns the classification
//! - `GET /leads/{id}/audit/stream` - Server-Sent Events, one per pipeline stage
//! - `POST /audits/batch` - queues a batch (`{"lead_ids": [..], "search_id": n}`)
//! - `GET /health` - liveness and configured capabilities

mod handlers;
mod types;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use handlers::{audit_handler, batch_handler, health_handler, stream_handler};
pub use types::{AppState, BatchAccepted, BatchRequest, HealthResponse};

/// Builds the router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/leads/{id}/audit", post(audit_handler))
        .route("/leads/{id}/audit/stream", get(stream_handler))
        .route("/audits/batch", post(batch_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serves the router on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Audit server listening on http://{addr}/");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| anyhow::anyhow!("Audit server error: {}", e))?;
    Ok(())
}

/// Binds `127.0.0.1:port` and serves the trigger endpoints.
pub async fn start_server(
    port: u16,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind audit server to port {}: {}", port, e))?;
    serve(listener, state, shutdown).await
}
