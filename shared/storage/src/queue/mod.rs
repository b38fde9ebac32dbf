//! Durable notification queue over AWS SQS
//!
//! The RPC surface publishes accepted notifications here; the sender pool
//! consumes them with explicit ack/reject, giving at-least-once delivery
//! across worker restarts.

mod error;
mod sqs;
mod types;

use async_trait::async_trait;

use push_domain::QueuedMessage;

pub use error::{QueueError, QueueResult};
pub use sqs::SqsQueue;
pub use types::{MessageGroupId, QueueConfig, QueueMessage};

/// The notification queue contract shared by the RPC surface (publish)
/// and the sender pool (poll/ack/reject).
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueues a message; returns the broker-assigned message id.
    async fn publish(&self, message: &QueuedMessage) -> QueueResult<String>;

    /// Receives up to the configured prefetch of messages, each under a
    /// visibility lease.
    async fn poll(&self) -> QueueResult<Vec<QueueMessage<QueuedMessage>>>;

    /// Acknowledges a processed message.
    async fn ack(&self, receipt_handle: &str) -> QueueResult<()>;

    /// Returns a failed message to the queue for redelivery.
    async fn reject(&self, receipt_handle: &str) -> QueueResult<()>;
}

#[async_trait]
impl MessageQueue for SqsQueue<QueuedMessage> {
    async fn publish(&self, message: &QueuedMessage) -> QueueResult<String> {
        self.send_message(message).await
    }

    async fn poll(&self) -> QueueResult<Vec<QueueMessage<QueuedMessage>>> {
        self.poll_messages().await
    }

    async fn ack(&self, receipt_handle: &str) -> QueueResult<()> {
        self.ack_message(receipt_handle).await
    }

    async fn reject(&self, receipt_handle: &str) -> QueueResult<()> {
        self.reject_message(receipt_handle).await
    }
}
