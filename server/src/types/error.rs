//! Error envelope and wire-code registry for the RPC surface
//!
//! Every domain error maps to one numeric wire code, offset from a fixed
//! base so clients can match codes without string comparison.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::push::PushError;

/// Base for the numeric wire error codes.
pub const ERROR_CODE_OFFSET: u32 = 1000;

/// Wire-level error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Any unclassified error
    Unexpected = 1,
    /// Payload signature mismatch
    InvalidSignature = 2,
    /// Per-topic signature mismatch
    InvalidTopicSignature = 3,
    /// Attempt to create an already-registered space
    SpaceExists = 4,
    /// Reserved
    NoValidTopics = 5,
}

impl ErrorCode {
    /// The numeric code carried on the wire.
    #[must_use]
    pub const fn wire_code(self) -> u32 {
        ERROR_CODE_OFFSET + self as u32
    }

    /// Machine-readable name carried next to the numeric code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unexpected => "unexpected",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidTopicSignature => "invalid_topic_signature",
            Self::SpaceExists => "space_exists",
            Self::NoValidTopics => "no_valid_topics",
        }
    }
}

/// API error response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    pub error: ErrorBody,
}

/// Error body containing the wire code and message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Numeric wire code
    pub code: u32,
    /// Machine-readable error name
    pub name: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl ApiError {
    /// Create a new application error
    #[must_use]
    pub fn new(
        status: StatusCode,
        code: ErrorCode,
        message: impl Into<String>,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code: code.wire_code(),
                    name: code.name(),
                    message: message.into(),
                },
            },
        }
    }

    /// Request lacks the transport-furnished caller identity
    #[must_use]
    pub fn missing_identity() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unexpected,
            "caller identity missing from request context",
            false,
        )
    }

    /// Transient infrastructure failure, worth retrying
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Unexpected,
            message,
            true,
        )
    }

    /// The wire code of this error, used in tests and logs.
    #[must_use]
    pub const fn wire_code(&self) -> u32 {
        self.inner.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "client error: {} - {}",
                self.inner.error.name,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "server error: {} - {}",
                self.inner.error.name,
                self.inner.error.message
            ),
            _ => {}
        }
        (self.status, Json(self.inner)).into_response()
    }
}

impl From<PushError> for ApiError {
    fn from(err: PushError) -> Self {
        match &err {
            PushError::InvalidSignature => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidSignature,
                "invalid signature",
                false,
            ),
            PushError::InvalidTopicSignature => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidTopicSignature,
                "invalid topic signature",
                false,
            ),
            PushError::MalformedKey(e) => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::Unexpected,
                e.to_string(),
                false,
            ),
            PushError::SpaceExists => Self::new(
                StatusCode::CONFLICT,
                ErrorCode::SpaceExists,
                "space already exists",
                false,
            ),
            PushError::SpaceNotFound => Self::new(
                StatusCode::NOT_FOUND,
                ErrorCode::Unexpected,
                "space not found",
                false,
            ),
            PushError::MalformedTopic(e) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::Unexpected,
                e.clone(),
                false,
            ),
            PushError::Account(_) | PushError::Token(_) | PushError::Space(_) | PushError::Queue(_) => {
                Self::unexpected(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn wire_codes_are_stable_offsets() {
        assert_eq!(ErrorCode::Unexpected.wire_code(), 1001);
        assert_eq!(ErrorCode::InvalidSignature.wire_code(), 1002);
        assert_eq!(ErrorCode::InvalidTopicSignature.wire_code(), 1003);
        assert_eq!(ErrorCode::SpaceExists.wire_code(), 1004);
        assert_eq!(ErrorCode::NoValidTopics.wire_code(), 1005);
    }

    #[test]
    fn signature_errors_map_to_client_codes() {
        let err = ApiError::from(PushError::InvalidTopicSignature);
        assert_eq!(err.wire_code(), ErrorCode::InvalidTopicSignature.wire_code());
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(!err.inner.allow_retry);
    }
}
