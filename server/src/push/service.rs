//! Push service operations
//!
//! Every mutating call is authenticated twice: the transport supplies the
//! caller identity, and the request itself carries Ed25519 proofs (space
//! signatures over topic names, the space key's signature over the
//! caller's account id, the caller's signature over notification
//! payloads). Verified notifications are enqueued; everything else goes
//! straight to the repositories.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use ed25519_dalek::VerifyingKey;
use thiserror::Error;
use tracing::debug;

use push_domain::crypto::{self, KeyError};
use push_domain::{Platform, QueuedMessage, Space, Token, TokenStatus, Topic};
use push_storage::account::{AccountRepo, AccountStorageError};
use push_storage::queue::{MessageQueue, QueueError};
use push_storage::space::{SpaceRepo, SpaceStorageError};
use push_storage::token::{TokenRepo, TokenStorageError};

use crate::middleware::CallerIdentity;
use crate::types::requests::{NotifyMessage, SignedTopic, TopicPair};

/// Domain errors of the push operations.
#[derive(Debug, Error)]
pub enum PushError {
    /// Payload signature mismatch under the caller's key
    #[error("invalid signature")]
    InvalidSignature,

    /// A topic signature did not verify under its space key
    #[error("invalid topic signature")]
    InvalidTopicSignature,

    /// A supplied public key could not be decoded
    #[error(transparent)]
    MalformedKey(#[from] KeyError),

    /// The space is already registered
    #[error("space already exists")]
    SpaceExists,

    /// No space matched the `(id, author)` pair
    #[error("space not found")]
    SpaceNotFound,

    /// A stored topic no longer parses into a space key
    #[error("malformed stored topic: {0}")]
    MalformedTopic(String),

    #[error(transparent)]
    Account(#[from] AccountStorageError),

    #[error(transparent)]
    Token(#[from] TokenStorageError),

    #[error("space storage error: {0}")]
    Space(SpaceStorageError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl From<SpaceStorageError> for PushError {
    fn from(err: SpaceStorageError) -> Self {
        match err {
            SpaceStorageError::SpaceExists => Self::SpaceExists,
            SpaceStorageError::SpaceNotFound => Self::SpaceNotFound,
            other => Self::Space(other),
        }
    }
}

/// The push RPC service.
pub struct PushService {
    account_repo: Arc<dyn AccountRepo>,
    token_repo: Arc<dyn TokenRepo>,
    space_repo: Arc<dyn SpaceRepo>,
    queue: Arc<dyn MessageQueue>,
}

impl PushService {
    /// Creates the service over the given repositories and queue.
    #[must_use]
    pub fn new(
        account_repo: Arc<dyn AccountRepo>,
        token_repo: Arc<dyn TokenRepo>,
        space_repo: Arc<dyn SpaceRepo>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        Self {
            account_repo,
            token_repo,
            space_repo,
            queue,
        }
    }

    /// Upserts the caller's device token for a platform.
    pub async fn set_token(
        &self,
        caller: &CallerIdentity,
        platform: Platform,
        token: String,
    ) -> Result<(), PushError> {
        self.token_repo
            .add_token(&Token {
                id: token,
                account_id: caller.account_id.clone(),
                peer_id: caller.peer_id.clone(),
                platform,
                status: TokenStatus::Valid,
                created: 0,
                updated: 0,
            })
            .await?;
        Ok(())
    }

    /// Deletes the token registered by the calling peer.
    pub async fn revoke_token(&self, caller: &CallerIdentity) -> Result<(), PushError> {
        self.token_repo
            .revoke_token(&caller.account_id, &caller.peer_id)
            .await?;
        Ok(())
    }

    /// Registers a space after the caller proves possession of its key by
    /// signing the caller's own account id. A duplicate registration reads
    /// as success to the caller.
    pub async fn create_space(
        &self,
        caller: &CallerIdentity,
        space_key: &[u8],
        signature: &[u8],
    ) -> Result<(), PushError> {
        let space = self.verified_space(caller, space_key, signature)?;
        match self.space_repo.create(&space).await {
            Ok(()) => Ok(()),
            Err(SpaceStorageError::SpaceExists) => {
                debug!(space = %space.id, "space already registered");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Unregisters a space; only its author may do so. A space that is
    /// already gone reads as success, mirroring `create_space`.
    pub async fn remove_space(
        &self,
        caller: &CallerIdentity,
        space_key: &[u8],
        signature: &[u8],
    ) -> Result<(), PushError> {
        let space = self.verified_space(caller, space_key, signature)?;
        match self.space_repo.remove(&space).await {
            Ok(()) => Ok(()),
            Err(SpaceStorageError::SpaceNotFound) => {
                debug!(space = %space.id, "space not registered");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The caller's current subscriptions, re-expanded into raw space
    /// keys and topic names.
    pub async fn subscriptions(
        &self,
        caller: &CallerIdentity,
    ) -> Result<Vec<TopicPair>, PushError> {
        let topics = self
            .account_repo
            .get_topics_by_account_id(&caller.account_id)
            .await?;
        topics
            .iter()
            .map(|topic| {
                Ok(TopicPair {
                    space_key: topic
                        .space_key_raw()
                        .map_err(|e| PushError::MalformedTopic(e.to_string()))?,
                    topic: topic.name().to_string(),
                })
            })
            .collect()
    }

    /// Replaces the caller's topic set with the given set.
    pub async fn replace_subscriptions(
        &self,
        caller: &CallerIdentity,
        topics: &[SignedTopic],
    ) -> Result<(), PushError> {
        let topics = verify_topics(topics)?;
        self.account_repo
            .set_account_topics(&caller.account_id, &topics)
            .await?;
        Ok(())
    }

    /// Removes the listed topics from the caller's set; topics not
    /// currently subscribed are ignored.
    pub async fn unsubscribe(
        &self,
        caller: &CallerIdentity,
        topics: &[SignedTopic],
    ) -> Result<(), PushError> {
        let remove = verify_topics(topics)?;
        let current = self
            .account_repo
            .get_topics_by_account_id(&caller.account_id)
            .await?;
        let remaining: Vec<Topic> = current
            .into_iter()
            .filter(|topic| !remove.contains(topic))
            .collect();
        self.account_repo
            .set_account_topics(&caller.account_id, &remaining)
            .await?;
        Ok(())
    }

    /// Verifies and enqueues a notification for every account subscribed
    /// to the surviving topics, excluding the caller itself.
    pub async fn notify(
        &self,
        caller: &CallerIdentity,
        topics: &[SignedTopic],
        message: &NotifyMessage,
        group_id: &str,
    ) -> Result<(), PushError> {
        let topics = verify_topics(topics)?;
        if !crypto::verify(&caller.public_key, &message.payload, &message.signature) {
            return Err(PushError::InvalidSignature);
        }

        let topics = self.filter_registered(topics).await?;
        if topics.is_empty() {
            debug!("no topics in registered spaces, nothing to enqueue");
            return Ok(());
        }

        self.queue
            .publish(&QueuedMessage {
                ignore_account_id: Some(caller.account_id.clone()),
                key_id: message.key_id.clone(),
                payload: message.payload.clone(),
                signature: message.signature.clone(),
                topics,
                group_id: group_id.to_string(),
                silent: false,
                created: Utc::now(),
            })
            .await?;
        Ok(())
    }

    /// Enqueues a silent push towards the caller's own devices: only
    /// topics whose name equals the caller's account id survive, and the
    /// payload is forwarded unverified (it may be absent entirely).
    pub async fn notify_silent(
        &self,
        caller: &CallerIdentity,
        topics: &[SignedTopic],
        message: Option<&NotifyMessage>,
        group_id: &str,
    ) -> Result<(), PushError> {
        let topics = verify_topics(topics)?;
        let topics: Vec<Topic> = self
            .filter_registered(topics)
            .await?
            .into_iter()
            .filter(|topic| topic.name() == caller.account_id)
            .collect();
        if topics.is_empty() {
            debug!("no self-delivery topics survive, nothing to enqueue");
            return Ok(());
        }

        let (key_id, payload, signature) = match message {
            Some(message) => (
                message.key_id.clone(),
                message.payload.clone(),
                message.signature.clone(),
            ),
            None => Default::default(),
        };
        self.queue
            .publish(&QueuedMessage {
                ignore_account_id: None,
                key_id,
                payload,
                signature,
                topics,
                group_id: group_id.to_string(),
                silent: true,
                created: Utc::now(),
            })
            .await?;
        Ok(())
    }

    fn verified_space(
        &self,
        caller: &CallerIdentity,
        space_key: &[u8],
        signature: &[u8],
    ) -> Result<Space, PushError> {
        let key = crypto::public_key_from_bytes(space_key)?;
        if !crypto::verify(&key, caller.account_id.as_bytes(), signature) {
            return Err(PushError::InvalidSignature);
        }
        Ok(Space {
            id: crypto::account_address(&key),
            author: caller.account_id.clone(),
            created: 0,
        })
    }

    /// Keeps only topics whose space is registered. The repository side
    /// of this check is currently a pass-through; the filtering here is
    /// what takes effect once it is enforced.
    async fn filter_registered(&self, topics: Vec<Topic>) -> Result<Vec<Topic>, PushError> {
        let mut seen = HashSet::new();
        let mut space_ids = Vec::new();
        for topic in &topics {
            let id = topic.space_key_base58().to_string();
            if seen.insert(id.clone()) {
                space_ids.push(id);
            }
        }
        let existing: HashSet<String> = self
            .space_repo
            .existing_spaces(&space_ids)
            .await
            .map_err(PushError::from)?
            .into_iter()
            .collect();
        Ok(topics
            .into_iter()
            .filter(|topic| existing.contains(topic.space_key_base58()))
            .collect())
    }
}

/// Verifies every topic's signature over its raw name bytes under the
/// topic's space key. Keys are decoded once per call, keyed by the raw
/// space-key bytes.
fn verify_topics(topics: &[SignedTopic]) -> Result<Vec<Topic>, PushError> {
    let mut keys: HashMap<&[u8], VerifyingKey> = HashMap::new();
    let mut verified = Vec::with_capacity(topics.len());

    for signed in topics {
        let key = match keys.get(signed.space_key.as_slice()) {
            Some(key) => *key,
            None => {
                let key = crypto::public_key_from_bytes(&signed.space_key)?;
                keys.insert(signed.space_key.as_slice(), key);
                key
            }
        };
        if !crypto::verify(&key, signed.topic.as_bytes(), &signed.signature) {
            return Err(PushError::InvalidTopicSignature);
        }
        verified.push(Topic::new(&signed.space_key, &signed.topic));
    }
    Ok(verified)
}
