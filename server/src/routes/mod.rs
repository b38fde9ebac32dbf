//! HTTP routes of the RPC surface
//!
//! Every `/v1` operation requires the transport-furnished caller
//! identity; the health probe does not.

pub mod health;
pub mod notify;
pub mod space;
pub mod subscription;
pub mod token;

use axum::routing::{get, post};
use axum::Router;

use crate::middleware::require_caller_identity;

/// Builds the service router.
pub fn handler() -> Router {
    Router::new()
        .route("/v1/token", post(token::set_token))
        .route("/v1/token/revoke", post(token::revoke_token))
        .route("/v1/space", post(space::create_space))
        .route("/v1/space/remove", post(space::remove_space))
        .route(
            "/v1/subscriptions",
            get(subscription::subscriptions).post(subscription::subscribe),
        )
        .route("/v1/subscriptions/all", post(subscription::subscribe_all))
        .route("/v1/subscriptions/remove", post(subscription::unsubscribe))
        .route("/v1/notify", post(notify::notify))
        .route("/v1/notify/silent", post(notify::notify_silent))
        .layer(axum::middleware::from_fn(require_caller_identity))
        .route("/health", get(health::health))
}
