//! Caller identity extraction
//!
//! The transport in front of the service mutually authenticates each peer
//! and stamps the peer id and account public key onto the request. Every
//! operation requires both; the handlers never reach into the transport
//! themselves.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use ed25519_dalek::VerifyingKey;

use push_domain::crypto;

use crate::types::ApiError;

/// Header carrying the authenticated peer id.
pub const PEER_ID_HEADER: &str = "x-peer-id";

/// Header carrying the caller's base58 Ed25519 public key.
pub const ACCOUNT_KEY_HEADER: &str = "x-account-key";

/// The authenticated caller of an operation.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Per-device identifier, stable across the transport session
    pub peer_id: String,
    /// base58 of the account public key
    pub account_id: String,
    /// The account public key itself
    pub public_key: VerifyingKey,
}

impl CallerIdentity {
    /// Reads the identity stamped by the authenticated transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::missing_identity`] when either header is
    /// absent, empty or not a valid account key.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let peer_id = headers
            .get(PEER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(ApiError::missing_identity)?;
        let account_key = headers
            .get(ACCOUNT_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(ApiError::missing_identity)?;

        let public_key =
            crypto::decode_account_address(account_key).map_err(|_| ApiError::missing_identity())?;

        Ok(Self {
            peer_id: peer_id.to_string(),
            // Re-derived from the key rather than trusted verbatim.
            account_id: crypto::account_address(&public_key),
            public_key,
        })
    }
}

/// Requires a caller identity on the request and exposes it to handlers.
pub async fn require_caller_identity(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = CallerIdentity::from_headers(request.headers())?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(ApiError::missing_identity)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use ed25519_dalek::SigningKey;
    use pretty_assertions::assert_eq;

    use super::*;

    fn headers(peer: &str, key: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(PEER_ID_HEADER, HeaderValue::from_str(peer).unwrap());
        map.insert(ACCOUNT_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        map
    }

    #[test]
    fn extracts_identity_from_headers() {
        let key = SigningKey::from_bytes(&[3; 32]).verifying_key();
        let address = crypto::account_address(&key);
        let identity = CallerIdentity::from_headers(&headers("peer-1", &address)).unwrap();

        assert_eq!(identity.peer_id, "peer-1");
        assert_eq!(identity.account_id, address);
        assert_eq!(identity.public_key, key);
    }

    #[test]
    fn missing_peer_id_is_fatal() {
        let key = SigningKey::from_bytes(&[3; 32]).verifying_key();
        let mut map = HeaderMap::new();
        map.insert(
            ACCOUNT_KEY_HEADER,
            HeaderValue::from_str(&crypto::account_address(&key)).unwrap(),
        );
        assert!(CallerIdentity::from_headers(&map).is_err());
    }

    #[test]
    fn malformed_account_key_is_fatal() {
        assert!(CallerIdentity::from_headers(&headers("peer-1", "!!not-base58!!")).is_err());
    }
}
