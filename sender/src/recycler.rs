//! Invalid-token recycling
//!
//! Provider adapters report dead tokens through a bounded channel; a
//! single batcher task drains it and deletes tokens in batches, so that
//! deletes are amortized while cleanup latency stays bounded.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use push_storage::token::TokenRepo;

/// Producer handle for reporting invalid tokens.
///
/// Cheap to clone; shared by every provider callback across the worker
/// pool. The channel closes when the last clone drops, which releases the
/// batcher.
#[derive(Clone)]
pub struct InvalidTokens {
    tx: flume::Sender<String>,
    send_timeout: Duration,
}

impl InvalidTokens {
    pub(crate) const fn new(tx: flume::Sender<String>, send_timeout: Duration) -> Self {
        Self { tx, send_timeout }
    }

    /// Queues a token for deletion.
    ///
    /// Blocks while the buffer is full, up to the configured timeout;
    /// a signal that cannot be placed in time is dropped with a warning
    /// rather than stalling delivery.
    pub async fn push(&self, token: String) {
        match timeout(self.send_timeout, self.tx.send_async(token)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(token = %err.0, "invalid-token channel closed, dropping signal"),
            Err(_) => warn!("invalid-token buffer full, dropping signal"),
        }
    }
}

/// Batcher loop: collects at least `batch_min` tokens or whatever arrived
/// within `window` of the first one, then deletes the batch. Exits once
/// the channel is closed and drained.
pub(crate) async fn run(
    token_repo: Arc<dyn TokenRepo>,
    rx: flume::Receiver<String>,
    batch_min: usize,
    window: Duration,
) {
    loop {
        let first = match rx.recv_async().await {
            Ok(token) => token,
            Err(flume::RecvError::Disconnected) => break,
        };

        let mut batch = vec![first];
        let deadline = Instant::now() + window;
        while batch.len() < batch_min {
            match timeout_at(deadline, rx.recv_async()).await {
                Ok(Ok(token)) => batch.push(token),
                Ok(Err(flume::RecvError::Disconnected)) | Err(_) => break,
            }
        }

        debug!(count = batch.len(), "removing invalid tokens");
        if let Err(err) = token_repo.remove_tokens(&batch).await {
            warn!(error = %err, "failed to remove invalid tokens");
        }
    }
}
