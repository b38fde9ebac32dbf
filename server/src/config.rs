//! Command line and configuration file handling

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use push_sender::provider::fcm::FcmConfig;
use push_storage::queue::QueueConfig;

/// Command line flags.
#[derive(Debug, Parser)]
#[command(name = "push-server", disable_version_flag = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short = 'c', long = "config", default_value = "etc/push-server.toml")]
    pub config: PathBuf,

    /// Show version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,
}

/// Server configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The server's own account id, used to identify this deployment in
    /// logs and operational tooling.
    pub account: String,
    pub listen: ListenConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    #[serde(default)]
    pub sender: SenderSection,
    /// Absent FCM credentials disable delivery (useful for local runs).
    pub fcm: Option<FcmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    pub addr: SocketAddr,
}

/// AWS client overrides; everything defaults to the SDK's environment
/// chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override for local stacks.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Table and index names of the DynamoDB layout.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_account_topics_table")]
    pub account_topics_table: String,
    #[serde(default = "default_topic_index")]
    pub topic_index: String,
    #[serde(default = "default_tokens_table")]
    pub tokens_table: String,
    #[serde(default = "default_account_index")]
    pub account_index: String,
    #[serde(default = "default_spaces_table")]
    pub spaces_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_topics_table: default_account_topics_table(),
            topic_index: default_topic_index(),
            tokens_table: default_tokens_table(),
            account_index: default_account_index(),
            spaces_table: default_spaces_table(),
        }
    }
}

fn default_account_topics_table() -> String {
    "push-account-topics".to_string()
}

fn default_topic_index() -> String {
    "topic-index".to_string()
}

fn default_tokens_table() -> String {
    "push-tokens".to_string()
}

fn default_account_index() -> String {
    "account-status-index".to_string()
}

fn default_spaces_table() -> String {
    "push-spaces".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderSection {
    #[serde(default = "default_num_workers")]
    pub workers: usize,
}

impl Default for SenderSection {
    fn default() -> Self {
        Self {
            workers: default_num_workers(),
        }
    }
}

const fn default_num_workers() -> usize {
    10
}

impl Config {
    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("can't open config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("can't parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            account = "A1"

            [listen]
            addr = "127.0.0.1:8271"

            [queue]
            queue_url = "http://localhost:4566/000000000000/msgs"
            "#,
        )
        .unwrap();

        assert_eq!(config.account, "A1");
        assert_eq!(config.sender.workers, 10);
        assert_eq!(config.queue.max_messages, 10);
        assert_eq!(config.storage.tokens_table, "push-tokens");
        assert!(config.fcm.is_none());
    }

    #[test]
    fn fcm_section_is_optional_but_complete_when_present() {
        let config: Config = toml::from_str(
            r#"
            account = "A1"

            [listen]
            addr = "0.0.0.0:8271"

            [queue]
            queue_url = "http://localhost:4566/000000000000/msgs"

            [fcm.credentials_file]
            ios = "/etc/fcm/ios.json"
            android = "/etc/fcm/android.json"

            [fcm.default_message]
            title = "New message"
            body = "You have a new message"
            image_url = "https://example.org/icon.png"
            "#,
        )
        .unwrap();

        let fcm = config.fcm.unwrap();
        assert_eq!(fcm.credentials_file.ios, "/etc/fcm/ios.json");
        assert_eq!(fcm.default_message.title, "New message");
    }
}
