//! Topic subscription management

use std::sync::Arc;

use axum::{Extension, Json};

use crate::middleware::CallerIdentity;
use crate::push::PushService;
use crate::types::{Ack, ApiError, SubscriptionsResponse, TopicsRequest};

/// `GET /v1/subscriptions`: the caller's current topic set.
pub async fn subscriptions(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
) -> Result<Json<SubscriptionsResponse>, ApiError> {
    let topics = service.subscriptions(&identity).await?;
    Ok(Json(SubscriptionsResponse { topics }))
}

/// `POST /v1/subscriptions`: replaces the caller's topic set.
pub async fn subscribe(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<TopicsRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .replace_subscriptions(&identity, &request.topics)
        .await?;
    Ok(Json(Ack::default()))
}

/// `POST /v1/subscriptions/all`: replaces the caller's topic set.
pub async fn subscribe_all(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<TopicsRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .replace_subscriptions(&identity, &request.topics)
        .await?;
    Ok(Json(Ack::default()))
}

/// `POST /v1/subscriptions/remove`: drops the listed topics from the
/// caller's set.
pub async fn unsubscribe(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<TopicsRequest>,
) -> Result<Json<Ack>, ApiError> {
    service.unsubscribe(&identity, &request.topics).await?;
    Ok(Json(Ack::default()))
}
