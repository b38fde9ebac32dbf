//! FCM HTTP v1 gateway client
//!
//! One authenticated `messages:send` call per token, run concurrently
//! within a batch; outcomes are collected in input order, the shape of the
//! gateway's multicast response array.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_auth::project::Config;
use google_cloud_auth::token::DefaultTokenSourceProvider;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use google_cloud_token::{TokenSource, TokenSourceProvider};

use crate::provider::ProviderError;

/// OAuth2 scope required by the FCM v1 send API.
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Concurrent in-flight sends within one batch.
const SEND_CONCURRENCY: usize = 8;

/// A user-visible notification block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Aps {
    #[serde(rename = "mutable-content", skip_serializing_if = "Option::is_none")]
    pub mutable_content: Option<u8>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApnsPayload {
    pub aps: Aps,
}

/// APNs pass-through settings attached to iOS sends.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

impl ApnsConfig {
    /// APNs settings for a visible notification (`mutable-content: 1`).
    #[must_use]
    pub const fn mutable() -> Self {
        Self {
            payload: ApnsPayload {
                aps: Aps {
                    mutable_content: Some(1),
                    content_available: None,
                },
            },
        }
    }

    /// APNs settings for a silent push (`content-available: 1`).
    #[must_use]
    pub const fn silent() -> Self {
        Self {
            payload: ApnsPayload {
                aps: Aps {
                    mutable_content: None,
                    content_available: Some(1),
                },
            },
        }
    }
}

/// The per-batch message template: everything except the target token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FcmPush {
    pub data: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<FcmNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: MessageBody<'a>,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    token: &'a str,
    #[serde(flatten)]
    push: &'a FcmPush,
}

/// A per-token delivery failure reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    /// FCM error code when present, otherwise the google.rpc status.
    pub status: String,
    pub message: String,
}

impl TokenError {
    /// Whether the token itself is dead and should be recycled.
    #[must_use]
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self.status.as_str(),
            "UNREGISTERED" | "INVALID_ARGUMENT" | "NOT_FOUND"
        )
    }
}

/// Outcome of a single token's send.
pub type TokenOutcome = Result<(), TokenError>;

#[derive(Debug, Deserialize)]
struct FcmErrorResponse {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

impl FcmErrorResponse {
    fn into_token_error(self) -> TokenError {
        let status = self
            .error
            .details
            .into_iter()
            .find_map(|d| d.error_code)
            .unwrap_or(self.error.status);
        TokenError {
            status,
            message: self.error.message,
        }
    }
}

/// The gateway seam of the FCM adapter.
#[async_trait]
pub trait FcmClient: Send + Sync {
    /// Sends `push` to each of `tokens`, returning one outcome per token
    /// in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] only on gateway-level failures; per-token
    /// failures land in the outcome vector.
    async fn send_each(
        &self,
        push: &FcmPush,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, ProviderError>;
}

#[async_trait]
impl<T: FcmClient + ?Sized> FcmClient for Arc<T> {
    async fn send_each(
        &self,
        push: &FcmPush,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, ProviderError> {
        (**self).send_each(push, tokens).await
    }
}

/// FCM HTTP v1 client authenticated with a service-account credentials
/// file.
pub struct HttpFcmClient {
    http: reqwest::Client,
    token_source: Arc<dyn TokenSource>,
    endpoint: String,
}

impl HttpFcmClient {
    /// Builds a client from a service-account credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Auth`] when the credentials cannot be
    /// loaded or carry no project id.
    pub async fn new(credentials_path: &str) -> Result<Self, ProviderError> {
        let credentials = CredentialsFile::new_from_file(credentials_path.to_string())
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;
        let provider = DefaultTokenSourceProvider::new_with_credentials(
            Config::default().with_scopes(&[FCM_SCOPE]),
            Box::new(credentials),
        )
        .await
        .map_err(|e| ProviderError::Auth(e.to_string()))?;
        let project_id = provider
            .project_id
            .clone()
            .ok_or_else(|| ProviderError::Auth("credentials carry no project id".to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            token_source: provider.token_source(),
            endpoint: format!("https://fcm.googleapis.com/v1/projects/{project_id}/messages:send"),
        })
    }

    async fn send_one(&self, authorization: &str, push: &FcmPush, token: &str) -> TokenOutcome {
        let request = SendRequest {
            message: MessageBody { token, push },
        };
        let response = match self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, authorization)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            // Counts as a transient per-token failure, not a dead token.
            Err(err) => {
                return Err(TokenError {
                    status: "UNAVAILABLE".to_string(),
                    message: err.to_string(),
                })
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match response.json::<FcmErrorResponse>().await {
            Ok(body) => Err(body.into_token_error()),
            Err(_) => Err(TokenError {
                status: status.to_string(),
                message: String::new(),
            }),
        }
    }
}

#[async_trait]
impl FcmClient for HttpFcmClient {
    async fn send_each(
        &self,
        push: &FcmPush,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, ProviderError> {
        let authorization = self
            .token_source
            .token()
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        let pending: Vec<std::pin::Pin<Box<dyn std::future::Future<Output = TokenOutcome> + Send + '_>>> =
            tokens
                .iter()
                .map(|token| Box::pin(self.send_one(&authorization, push, token)) as _)
                .collect();
        let outcomes = futures::stream::iter(pending)
            .buffered(SEND_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;
        Ok(outcomes)
    }
}
