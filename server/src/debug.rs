//! Debug HTTP listener
//!
//! Enabled with `ANYPROF=<addr>`: a side listener exposing liveness and
//! build information for operational poking, separate from the RPC
//! surface.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Environment variable holding the debug listener address.
pub const DEBUG_ADDR_ENV: &str = "ANYPROF";

async fn build_info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Starts the debug server on `addr`.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the address.
pub async fn start(addr: String, shutdown: CancellationToken) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/debug/build", get(build_info));

    let listener = TcpListener::bind(&addr).await?;
    info!("debug server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    Ok(())
}
