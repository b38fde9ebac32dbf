//! HTTP listener wiring

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Extension;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::push::PushService;
use crate::routes;

/// Serves the RPC surface until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the listener fails to bind or the server fails.
pub async fn start(
    addr: SocketAddr,
    service: Arc<PushService>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let router = routes::handler()
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("push server listening on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    Ok(())
}
