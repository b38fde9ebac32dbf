//! FCM adapter configuration

use serde::Deserialize;

/// FCM section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    pub credentials_file: CredentialsFiles,
    #[serde(default)]
    pub default_message: DefaultMessage,
}

/// Per-platform service-account credential files.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsFiles {
    pub ios: String,
    pub android: String,
}

/// Defaults shown on user-visible notifications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultMessage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image_url: String,
}
