//! In-memory fakes for exercising the sender pool without AWS or FCM

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use push_domain::{QueuedMessage, Token, TokenStatus, Topic};
use push_sender::provider::fcm::{FcmClient, FcmPush, TokenError, TokenOutcome};
use push_sender::provider::ProviderError;
use push_storage::account::{AccountRepo, AccountStorageResult};
use push_storage::queue::{MessageQueue, QueueMessage, QueueResult};
use push_storage::token::{TokenRepo, TokenStorageResult};

/// Subscription index backed by a map; account order is deterministic.
#[derive(Default)]
pub struct InMemoryAccountRepo {
    topics: Mutex<BTreeMap<String, Vec<Topic>>>,
}

impl InMemoryAccountRepo {
    pub fn with_subscriptions(entries: impl IntoIterator<Item = (String, Vec<Topic>)>) -> Self {
        Self {
            topics: Mutex::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl AccountRepo for InMemoryAccountRepo {
    async fn set_account_topics(
        &self,
        account_id: &str,
        topics: &[Topic],
    ) -> AccountStorageResult<()> {
        self.topics
            .lock()
            .unwrap()
            .insert(account_id.to_string(), topics.to_vec());
        Ok(())
    }

    async fn get_account_ids_by_topics(
        &self,
        topics: &[Topic],
    ) -> AccountStorageResult<Vec<String>> {
        Ok(self
            .topics
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, subscribed)| subscribed.iter().any(|t| topics.contains(t)))
            .map(|(account_id, _)| account_id.clone())
            .collect())
    }

    async fn get_topics_by_account_id(&self, account_id: &str) -> AccountStorageResult<Vec<Topic>> {
        Ok(self
            .topics
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Token table fake that records batch removals.
#[derive(Default)]
pub struct InMemoryTokenRepo {
    tokens: Mutex<Vec<Token>>,
    pub removed: Mutex<Vec<Vec<String>>>,
}

impl InMemoryTokenRepo {
    pub fn with_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens: Mutex::new(tokens),
            removed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TokenRepo for InMemoryTokenRepo {
    async fn add_token(&self, token: &Token) -> TokenStorageResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|t| t.id != token.id);
        tokens.push(token.clone());
        Ok(())
    }

    async fn update_token_status(
        &self,
        token_id: &str,
        status: TokenStatus,
    ) -> TokenStorageResult<()> {
        for token in self.tokens.lock().unwrap().iter_mut() {
            if token.id == token_id {
                token.status = status;
            }
        }
        Ok(())
    }

    async fn revoke_token(&self, account_id: &str, peer_id: &str) -> TokenStorageResult<()> {
        self.tokens
            .lock()
            .unwrap()
            .retain(|t| !(t.account_id == account_id && t.peer_id == peer_id));
        Ok(())
    }

    async fn get_active_tokens_by_account_ids(
        &self,
        account_ids: &[String],
    ) -> TokenStorageResult<Vec<Token>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status == TokenStatus::Valid && account_ids.contains(&t.account_id))
            .cloned()
            .collect())
    }

    async fn remove_tokens(&self, token_ids: &[String]) -> TokenStorageResult<()> {
        self.removed.lock().unwrap().push(token_ids.to_vec());
        self.tokens
            .lock()
            .unwrap()
            .retain(|t| !token_ids.contains(&t.id));
        Ok(())
    }
}

/// Queue fake: preloaded messages, ack/reject recorded. Redelivery is not
/// simulated; a rejected receipt is only remembered.
#[derive(Default)]
pub struct InMemoryQueue {
    pending: Mutex<VecDeque<QueueMessage<QueuedMessage>>>,
    pub acked: Mutex<Vec<String>>,
    pub rejected: Mutex<Vec<String>>,
    seq: AtomicUsize,
}

impl InMemoryQueue {
    pub fn with_messages(messages: impl IntoIterator<Item = QueuedMessage>) -> Self {
        let queue = Self::default();
        {
            let mut pending = queue.pending.lock().unwrap();
            for body in messages {
                let id = queue.seq.fetch_add(1, Ordering::SeqCst).to_string();
                pending.push_back(QueueMessage {
                    body,
                    receipt_handle: id.clone(),
                    message_id: id,
                });
            }
        }
        queue
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn publish(&self, message: &QueuedMessage) -> QueueResult<String> {
        let id = self.seq.fetch_add(1, Ordering::SeqCst).to_string();
        self.pending.lock().unwrap().push_back(QueueMessage {
            body: message.clone(),
            receipt_handle: id.clone(),
            message_id: id.clone(),
        });
        Ok(id)
    }

    async fn poll(&self) -> QueueResult<Vec<QueueMessage<QueuedMessage>>> {
        let mut pending = self.pending.lock().unwrap();
        let take = pending.len().min(10);
        Ok(pending.drain(..take).collect())
    }

    async fn ack(&self, receipt_handle: &str) -> QueueResult<()> {
        self.acked.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }

    async fn reject(&self, receipt_handle: &str) -> QueueResult<()> {
        self.rejected
            .lock()
            .unwrap()
            .push(receipt_handle.to_string());
        Ok(())
    }
}

/// FCM gateway fake: records `(push, tokens)` batches and answers from a
/// per-token failure script.
#[derive(Default)]
pub struct MockGateway {
    pub batches: Mutex<Vec<(FcmPush, Vec<String>)>>,
    failures: HashMap<String, TokenError>,
    gateway_error: bool,
}

impl MockGateway {
    pub fn failing(failures: impl IntoIterator<Item = (String, TokenError)>) -> Self {
        Self {
            failures: failures.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn erroring() -> Self {
        Self {
            gateway_error: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl FcmClient for MockGateway {
    async fn send_each(
        &self,
        push: &FcmPush,
        tokens: &[String],
    ) -> Result<Vec<TokenOutcome>, ProviderError> {
        if self.gateway_error {
            return Err(ProviderError::Gateway("backend unavailable".to_string()));
        }
        self.batches
            .lock()
            .unwrap()
            .push((push.clone(), tokens.to_vec()));
        Ok(tokens
            .iter()
            .map(|token| match self.failures.get(token) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            })
            .collect())
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
