//! Firebase Cloud Messaging provider adapter
//!
//! One adapter instance per platform, each with its own credential-scoped
//! gateway client. Visible iOS pushes carry the configured notification
//! block plus APNs `mutable-content`; Android pushes are data-only with
//! the defaults embedded as `x-any-*` entries. Silent pushes on both
//! platforms carry data only.

mod client;
mod config;

use async_trait::async_trait;
use tracing::{info, warn};

use push_domain::{Platform, PushMessage};

pub use client::{
    ApnsConfig, FcmClient, FcmNotification, FcmPush, HttpFcmClient, TokenError, TokenOutcome,
};
pub use config::{CredentialsFiles, DefaultMessage, FcmConfig};

use crate::provider::{Provider, ProviderError};
use crate::recycler::InvalidTokens;

/// The gateway's multicast ceiling.
pub const FCM_BATCH_SIZE: usize = 500;

/// FCM provider adapter for one platform.
pub struct FcmProvider<C = HttpFcmClient> {
    client: C,
    defaults: DefaultMessage,
}

impl FcmProvider<HttpFcmClient> {
    /// Builds the adapter with an HTTP gateway client scoped to the given
    /// service-account credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Auth`] when the credentials cannot be
    /// loaded.
    pub async fn new(
        credentials_path: &str,
        defaults: DefaultMessage,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: HttpFcmClient::new(credentials_path).await?,
            defaults,
        })
    }
}

impl<C: FcmClient> FcmProvider<C> {
    /// Builds the adapter over an arbitrary gateway client.
    pub const fn with_client(client: C, defaults: DefaultMessage) -> Self {
        Self { client, defaults }
    }

    fn notification(&self) -> FcmNotification {
        FcmNotification {
            title: self.defaults.title.clone(),
            body: self.defaults.body.clone(),
            image: if self.defaults.image_url.is_empty() {
                None
            } else {
                Some(self.defaults.image_url.clone())
            },
        }
    }

    fn build_push(&self, message: &PushMessage) -> FcmPush {
        match (message.platform, message.silent) {
            (Platform::Ios, false) => FcmPush {
                data: message.data.clone(),
                notification: Some(self.notification()),
                apns: Some(ApnsConfig::mutable()),
            },
            (Platform::Ios, true) => FcmPush {
                data: message.data.clone(),
                notification: None,
                apns: Some(ApnsConfig::silent()),
            },
            (Platform::Android, false) => {
                let mut data = message.data.clone();
                data.insert("x-any-title".to_string(), self.defaults.title.clone());
                data.insert("x-any-body".to_string(), self.defaults.body.clone());
                data.insert(
                    "x-any-image-url".to_string(),
                    self.defaults.image_url.clone(),
                );
                FcmPush {
                    data,
                    notification: None,
                    apns: None,
                }
            }
            (Platform::Android, true) => FcmPush {
                data: message.data.clone(),
                notification: None,
                apns: None,
            },
        }
    }
}

#[async_trait]
impl<C: FcmClient> Provider for FcmProvider<C> {
    async fn send_message(
        &self,
        message: &PushMessage,
        invalid: &InvalidTokens,
    ) -> Result<(), ProviderError> {
        let push = self.build_push(message);

        for chunk in message.tokens.chunks(FCM_BATCH_SIZE) {
            let outcomes = self.client.send_each(&push, chunk).await?;

            let mut success = 0usize;
            let mut failure = 0usize;
            for (token, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => success += 1,
                    Err(err) if err.is_invalid_token() => {
                        failure += 1;
                        invalid.push(token.clone()).await;
                        info!(token, status = %err.status, "marking token as invalid");
                    }
                    Err(err) => {
                        failure += 1;
                        warn!(token, status = %err.status, message = %err.message, "fcm returned error");
                    }
                }
            }
            info!(success, failure, platform = %message.platform, "push batch sent");
        }
        Ok(())
    }
}
