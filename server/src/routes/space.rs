//! Space registration

use std::sync::Arc;

use axum::{Extension, Json};

use crate::middleware::CallerIdentity;
use crate::push::PushService;
use crate::types::{Ack, ApiError, SpaceRequest};

/// `POST /v1/space`: registers a space under the caller after verifying
/// the space key's signature over the caller's account id.
pub async fn create_space(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<SpaceRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .create_space(&identity, &request.space_key, &request.signature)
        .await?;
    Ok(Json(Ack::default()))
}

/// `POST /v1/space/remove`: unregisters a space owned by the caller.
pub async fn remove_space(
    identity: CallerIdentity,
    Extension(service): Extension<Arc<PushService>>,
    Json(request): Json<SpaceRequest>,
) -> Result<Json<Ack>, ApiError> {
    service
        .remove_space(&identity, &request.space_key, &request.signature)
        .await?;
    Ok(Json(Ack::default()))
}
