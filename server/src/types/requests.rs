//! Request and response bodies of the RPC surface
//!
//! Raw key, payload and signature bytes travel base64-encoded in JSON.

use serde::{Deserialize, Serialize};

use push_domain::message::b64;
use push_domain::Platform;

/// Empty acknowledgement returned by mutating operations.
#[derive(Debug, Default, Serialize)]
pub struct Ack {}

/// Body of `POST /v1/token`.
#[derive(Debug, Deserialize)]
pub struct SetTokenRequest {
    pub platform: Platform,
    pub token: String,
}

/// Body of `POST /v1/space` and `POST /v1/space/remove`: the raw space
/// key plus its signature over the caller's account id.
#[derive(Debug, Deserialize)]
pub struct SpaceRequest {
    #[serde(with = "b64")]
    pub space_key: Vec<u8>,
    #[serde(with = "b64")]
    pub signature: Vec<u8>,
}

/// A topic as sent by clients: raw space key, topic name and the space
/// key's signature over the raw name bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedTopic {
    #[serde(with = "b64")]
    pub space_key: Vec<u8>,
    pub topic: String,
    #[serde(with = "b64")]
    pub signature: Vec<u8>,
}

/// Body of the subscription mutations.
#[derive(Debug, Deserialize)]
pub struct TopicsRequest {
    pub topics: Vec<SignedTopic>,
}

/// The opaque notification content: forwarded verbatim to devices after
/// the signature is verified against the sender's key.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyMessage {
    #[serde(default)]
    pub key_id: String,
    #[serde(default, with = "b64")]
    pub payload: Vec<u8>,
    #[serde(default, with = "b64")]
    pub signature: Vec<u8>,
}

/// Body of `POST /v1/notify`.
#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub topics: Vec<SignedTopic>,
    pub message: NotifyMessage,
    #[serde(default)]
    pub group_id: String,
}

/// Body of `POST /v1/notify/silent`; the message may be absent.
#[derive(Debug, Deserialize)]
pub struct SilentNotifyRequest {
    pub topics: Vec<SignedTopic>,
    #[serde(default)]
    pub message: Option<NotifyMessage>,
    #[serde(default)]
    pub group_id: String,
}

/// One subscription entry re-expanded into its raw space key and name.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TopicPair {
    #[serde(with = "b64")]
    pub space_key: Vec<u8>,
    pub topic: String,
}

/// Response of `GET /v1/subscriptions`.
#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub topics: Vec<TopicPair>,
}
