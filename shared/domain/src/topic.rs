//! Space-scoped subscription topics
//!
//! A topic is a single string `base58(space_key) + "/" + name`. The prefix
//! identifies the 32-byte Ed25519 public key of the space, the suffix is an
//! arbitrary UTF-8 name. Parsing always splits on the first `/`.

use serde::{Deserialize, Serialize};

/// The smallest unit of subscription: `base58(space_key)/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Forms a topic from the raw space key and the topic name.
    #[must_use]
    pub fn new(space_key: &[u8], name: &str) -> Self {
        Self(format!("{}/{}", bs58::encode(space_key).into_string(), name))
    }

    /// The base58 space-key prefix, or an empty string when the topic has no
    /// `/` separator.
    #[must_use]
    pub fn space_key_base58(&self) -> &str {
        match self.0.find('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// The raw space-key bytes decoded from the prefix.
    ///
    /// # Errors
    ///
    /// Returns `bs58::decode::Error` when the prefix is not valid base58.
    pub fn space_key_raw(&self) -> Result<Vec<u8>, bs58::decode::Error> {
        bs58::decode(self.space_key_base58()).into_vec()
    }

    /// The topic name after the first `/`, or an empty string when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.0.find('/') {
            Some(idx) if idx + 1 < self.0.len() => &self.0[idx + 1..],
            _ => "",
        }
    }

    /// The full topic string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
