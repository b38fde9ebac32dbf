//! Device token registration

use std::sync::Arc;

use axum::{Extension, Json};

use crate::middleware::CallerIdentity;
use crate::push::PushService;
use crate::types::{Ack, ApiError, SetTokenRequest};

/// `POST /v1/token`: upserts the caller's device token.
pub async fn set_token(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<SetTokenRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .set_token(&identity, request.platform, request.token)
        .await?;
    Ok(Json(Ack::default()))
}

/// `POST /v1/token/revoke`: drops the token registered by the calling
/// peer.
pub async fn revoke_token(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
) -> Result<Json<Ack>, ApiError> {
    service.revoke_token(&identity).await?;
    Ok(Json(Ack::default()))
}
