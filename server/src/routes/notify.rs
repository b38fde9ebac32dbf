//! Notification ingestion

use std::sync::Arc;

use axum::{Extension, Json};

use crate::middleware::CallerIdentity;
use crate::push::PushService;
use crate::types::{Ack, ApiError, NotifyRequest, SilentNotifyRequest};

/// `POST /v1/notify`: verifies and enqueues a broadcast towards every
/// subscriber of the given topics.
pub async fn notify(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .notify(&identity, &request.topics, &request.message, &request.group_id)
        .await?;
    Ok(Json(Ack::default()))
}

/// `POST /v1/notify/silent`: enqueues a background push towards the
/// caller's own devices.
pub async fn notify_silent(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<SilentNotifyRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .notify_silent(
            &identity,
            &request.topics,
            request.message.as_ref(),
            &request.group_id,
        )
        .await?;
    Ok(Json(Ack::default()))
}
