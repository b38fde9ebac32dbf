//! Queue consumer pool
//!
//! Ten workers poll the notification queue; each message is resolved
//! topics -> accounts -> active tokens, grouped per platform and handed
//! to the registered provider adapters. A provider error pushes the
//! message back for redelivery (at-least-once); everything else acks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use push_domain::{Platform, PushMessage, QueuedMessage};
use push_storage::account::{AccountRepo, AccountStorageError};
use push_storage::queue::{MessageQueue, QueueMessage};
use push_storage::token::{TokenRepo, TokenStorageError};

use crate::metrics::{SEND_COUNT, SEND_DURATION, SEND_TOKENS};
use crate::provider::{Provider, ProviderError};
use crate::recycler::{self, InvalidTokens};

/// Errors that fail a message and return it to the queue.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Account(#[from] AccountStorageError),

    #[error(transparent)]
    Token(#[from] TokenStorageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Tuning knobs for the consumer pool and the recycler.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Number of queue consumer workers
    pub num_workers: usize,
    /// Pause between empty polls
    pub poll_interval: Duration,
    /// Capacity of the invalid-token channel
    pub invalid_capacity: usize,
    /// Minimum recycler batch before an early flush
    pub invalid_batch_min: usize,
    /// Time cap on accumulating a recycler batch
    pub invalid_batch_window: Duration,
    /// Bound on a blocked invalid-token report
    pub invalid_send_timeout: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            num_workers: 10,
            poll_interval: Duration::from_millis(100),
            invalid_capacity: 100,
            invalid_batch_min: 10,
            invalid_batch_window: Duration::from_secs(1),
            invalid_send_timeout: Duration::from_secs(10),
        }
    }
}

/// The sender worker pool.
///
/// Providers are registered during construction, before `start`; the map
/// is read-only afterwards.
pub struct Sender {
    account_repo: Arc<dyn AccountRepo>,
    token_repo: Arc<dyn TokenRepo>,
    queue: Arc<dyn MessageQueue>,
    providers: HashMap<Platform, Arc<dyn Provider>>,
    config: SenderConfig,
}

/// Join handle over the running pool; resolves after every worker has
/// finished its in-flight message and the recycler has drained.
pub struct SenderHandle {
    workers: Vec<JoinHandle<()>>,
    recycler: JoinHandle<()>,
}

impl SenderHandle {
    /// Waits for the pool to wind down.
    pub async fn join(self) {
        for handle in self.workers {
            if let Err(err) = handle.await {
                error!("sender worker task error: {}", err);
            }
        }
        if let Err(err) = self.recycler.await {
            error!("recycler task error: {}", err);
        }
        info!("sender pool stopped");
    }
}

impl Sender {
    /// Creates a pool over the given repositories and queue.
    #[must_use]
    pub fn new(
        account_repo: Arc<dyn AccountRepo>,
        token_repo: Arc<dyn TokenRepo>,
        queue: Arc<dyn MessageQueue>,
        config: SenderConfig,
    ) -> Self {
        Self {
            account_repo,
            token_repo,
            queue,
            providers: HashMap::new(),
            config,
        }
    }

    /// Registers the provider adapter for a platform.
    pub fn register_provider(&mut self, platform: Platform, provider: Arc<dyn Provider>) {
        self.providers.insert(platform, provider);
    }

    /// Spawns the consumer workers and the invalid-token recycler.
    ///
    /// Cancelling `shutdown` stops polling; workers finish the message in
    /// hand, then the recycler channel closes and the batcher flushes.
    #[must_use]
    pub fn start(self, shutdown: CancellationToken) -> SenderHandle {
        let (invalid_tx, invalid_rx) = flume::bounded(self.config.invalid_capacity);
        let invalid = InvalidTokens::new(invalid_tx, self.config.invalid_send_timeout);

        let recycler = tokio::spawn(recycler::run(
            self.token_repo.clone(),
            invalid_rx,
            self.config.invalid_batch_min,
            self.config.invalid_batch_window,
        ));

        let num_workers = self.config.num_workers;
        let sender = Arc::new(self);
        info!("starting sender pool with {} workers", num_workers);

        let workers = (0..num_workers)
            .map(|worker_id| {
                let sender = sender.clone();
                let invalid = invalid.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    sender.worker_loop(worker_id, invalid, shutdown).await;
                })
            })
            .collect();

        SenderHandle { workers, recycler }
    }

    async fn worker_loop(
        &self,
        worker_id: usize,
        invalid: InvalidTokens,
        shutdown: CancellationToken,
    ) {
        info!("sender worker {} started", worker_id);

        'outer: loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                polled = self.queue.poll() => {
                    let deliveries = match polled {
                        Ok(deliveries) => deliveries,
                        Err(err) => {
                            warn!(worker_id, error = %err, "queue poll failed");
                            tokio::select! {
                                () = shutdown.cancelled() => break,
                                () = tokio::time::sleep(Duration::from_secs(1)) => continue,
                            }
                        }
                    };
                    if deliveries.is_empty() {
                        tokio::select! {
                            () = shutdown.cancelled() => break,
                            () = tokio::time::sleep(self.config.poll_interval) => continue,
                        }
                    }
                    for delivery in deliveries {
                        // Unhandled leases lapse back onto the queue.
                        if shutdown.is_cancelled() {
                            break 'outer;
                        }
                        self.handle_delivery(worker_id, &delivery, &invalid).await;
                    }
                }
            }
        }

        info!("sender worker {} stopped", worker_id);
    }

    async fn handle_delivery(
        &self,
        worker_id: usize,
        delivery: &QueueMessage<QueuedMessage>,
        invalid: &InvalidTokens,
    ) {
        match self.process(&delivery.body, invalid).await {
            Ok(()) => {
                if let Err(err) = self.queue.ack(&delivery.receipt_handle).await {
                    warn!(worker_id, error = %err, "failed to ack message");
                }
            }
            Err(err) => {
                warn!(worker_id, error = %err, "message processing failed, returning to queue");
                if let Err(err) = self.queue.reject(&delivery.receipt_handle).await {
                    warn!(worker_id, error = %err, "failed to return message to queue");
                }
            }
        }
    }

    async fn process(
        &self,
        message: &QueuedMessage,
        invalid: &InvalidTokens,
    ) -> Result<(), SendError> {
        let mut account_ids = self
            .account_repo
            .get_account_ids_by_topics(&message.topics)
            .await?;
        if let Some(ignore) = &message.ignore_account_id {
            account_ids.retain(|account_id| account_id != ignore);
        }

        let tokens = self
            .token_repo
            .get_active_tokens_by_account_ids(&account_ids)
            .await?;
        if tokens.is_empty() {
            return Ok(());
        }

        let data = HashMap::from([
            ("x-any-key-id".to_string(), message.key_id.clone()),
            ("x-any-payload".to_string(), STANDARD.encode(&message.payload)),
            ("x-any-signature".to_string(), STANDARD.encode(&message.signature)),
        ]);

        let mut by_platform: HashMap<Platform, PushMessage> = HashMap::new();
        for token in tokens {
            by_platform
                .entry(token.platform)
                .or_insert_with(|| PushMessage {
                    platform: token.platform,
                    tokens: Vec::new(),
                    data: data.clone(),
                    silent: message.silent,
                })
                .tokens
                .push(token.id);
        }

        for (platform, push_message) in by_platform {
            let Some(provider) = self.providers.get(&platform) else {
                warn!(platform = %platform, "no provider registered, skipping");
                continue;
            };
            let token_count = push_message.tokens.len();
            provider.send_message(&push_message, invalid).await?;

            ::metrics::counter!(SEND_COUNT).increment(1);
            ::metrics::counter!(SEND_TOKENS).increment(token_count as u64);
            let elapsed = (Utc::now() - message.created)
                .to_std()
                .unwrap_or(Duration::ZERO);
            ::metrics::histogram!(SEND_DURATION, "platform" => platform.to_string())
                .record(elapsed.as_secs_f64());
        }
        Ok(())
    }
}
