//! Device tokens and their platforms

use serde::{Deserialize, Serialize};
use strum::Display;

/// Mobile platform a device token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Ios,
    Android,
}

/// Delivery status of a device token.
///
/// The only transition is `Valid -> Invalid`, made when the push gateway
/// reports the token as unregistered or malformed. Invalid tokens are
/// removed in batches by the recycler rather than kept around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TokenStatus {
    Valid,
    Invalid,
}

/// A provider-issued device token registered by a peer.
///
/// Keyed by the token itself; one account may hold several tokens, one per
/// registered peer device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub account_id: String,
    pub peer_id: String,
    pub platform: Platform,
    pub status: TokenStatus,
    pub created: i64,
    pub updated: i64,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn platform_display_matches_wire_form() {
        assert_eq!(Platform::Ios.to_string(), "ios");
        assert_eq!(Platform::Android.to_string(), "android");
        assert_eq!(serde_json::to_string(&Platform::Android).unwrap(), "\"android\"");
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TokenStatus::Valid).unwrap(), "\"valid\"");
        assert_eq!(TokenStatus::Invalid.to_string(), "invalid");
    }
}
