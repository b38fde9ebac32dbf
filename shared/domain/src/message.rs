//! Messages flowing through the queue and out to providers

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token::Platform;
use crate::topic::Topic;

/// Base64 (de)serialization for opaque byte fields on the queue wire.
pub mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// A notification accepted by the RPC surface and queued for fan-out.
///
/// `payload` and `signature` are opaque to the server past enqueue time:
/// the signature is checked once against the sender's key, then both are
/// forwarded verbatim to subscribed devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    /// Sender account excluded from delivery; absent for silent pushes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_account_id: Option<String>,
    #[serde(default)]
    pub key_id: String,
    #[serde(default, with = "b64")]
    pub payload: Vec<u8>,
    #[serde(default, with = "b64")]
    pub signature: Vec<u8>,
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub silent: bool,
    pub created: DateTime<Utc>,
}

/// The per-platform fan-out unit handed to a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub platform: Platform,
    pub tokens: Vec<String>,
    pub data: HashMap<String, String>,
    pub silent: bool,
}
