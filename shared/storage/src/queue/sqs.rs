//! Generic SQS queue implementation
//!
//! A durable FIFO of JSON-encoded messages with explicit ack (delete) and
//! reject (visibility reset, immediate redelivery). Works with any message
//! type that implements the required traits.

use std::sync::Arc;

use aws_sdk_sqs::Client as SqsClient;
use serde::{de::DeserializeOwned, Serialize};

use crate::queue::error::QueueResult;
use crate::queue::types::{MessageGroupId, QueueConfig, QueueMessage};

/// Generic SQS queue for handling any message type
pub struct SqsQueue<T> {
    sqs_client: Arc<SqsClient>,
    config: QueueConfig,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> SqsQueue<T>
where
    T: Serialize + DeserializeOwned + MessageGroupId + Send + Sync,
{
    /// Creates a new generic SQS queue
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Pre-configured SQS client
    /// * `config` - Queue configuration including URL and default parameters
    #[must_use]
    pub const fn new(sqs_client: Arc<SqsClient>, config: QueueConfig) -> Self {
        Self {
            sqs_client,
            config,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Sends a message to the queue
    ///
    /// # Returns
    ///
    /// The message ID if successful or an empty string
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the send operation fails
    pub async fn send_message(&self, message: &T) -> QueueResult<String> {
        let body = serde_json::to_string(message)?;

        let result = self
            .sqs_client
            .send_message()
            .queue_url(&self.config.queue_url)
            .message_body(body)
            .message_group_id(message.message_group_id())
            .send()
            .await?;

        Ok(result
            .message_id()
            .map(std::string::ToString::to_string)
            .unwrap_or_default())
    }

    /// Polls messages from the queue
    ///
    /// Malformed bodies are logged and dropped rather than redelivered
    /// forever.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the poll operation fails
    pub async fn poll_messages(&self) -> QueueResult<Vec<QueueMessage<T>>> {
        let result = self
            .sqs_client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.max_messages)
            .visibility_timeout(self.config.visibility_timeout)
            .wait_time_seconds(self.config.wait_time_seconds)
            .send()
            .await?;

        let messages = result
            .messages()
            .iter()
            .filter_map(|msg| {
                let body = msg.body()?;
                let receipt_handle = msg.receipt_handle()?.to_string();
                let message_id = msg.message_id()?.to_string();

                match serde_json::from_str::<T>(body) {
                    Ok(parsed) => Some(QueueMessage {
                        body: parsed,
                        receipt_handle,
                        message_id,
                    }),
                    Err(e) => {
                        tracing::error!("Failed to deserialize message: {}", e);
                        None
                    }
                }
            })
            .collect();

        Ok(messages)
    }

    /// Acknowledges a message by deleting it from the queue
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the acknowledgment fails
    pub async fn ack_message(&self, receipt_handle: &str) -> QueueResult<()> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }

    /// Rejects a message, returning it to the queue for redelivery
    ///
    /// Resets the visibility lease so the message becomes receivable
    /// again immediately.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the visibility reset fails
    pub async fn reject_message(&self, receipt_handle: &str) -> QueueResult<()> {
        self.sqs_client
            .change_message_visibility()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(0)
            .send()
            .await?;

        Ok(())
    }
}
