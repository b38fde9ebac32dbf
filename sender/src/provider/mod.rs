//! Platform provider adapters
//!
//! A provider translates a per-platform [`PushMessage`] into batched push
//! gateway calls and classifies per-token failures: dead tokens go to the
//! recycler, everything else is logged and skipped. Only gateway-level
//! failures (authorization, transport before a per-token verdict exists)
//! surface as errors and push the message back onto the queue.

pub mod fcm;

use async_trait::async_trait;
use thiserror::Error;

use push_domain::PushMessage;

use crate::recycler::InvalidTokens;

/// Errors that abort a provider dispatch as a whole.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Could not obtain or refresh gateway credentials
    #[error("gateway authorization failed: {0}")]
    Auth(String),

    /// Transport failure before any per-token verdict
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Gateway-level rejection not attributable to a single token
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// A platform-specific push gateway adapter.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Delivers `message` to all its tokens, reporting dead tokens via
    /// `invalid`.
    async fn send_message(
        &self,
        message: &PushMessage,
        invalid: &InvalidTokens,
    ) -> Result<(), ProviderError>;
}
