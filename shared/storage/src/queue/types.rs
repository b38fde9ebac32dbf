use serde::Deserialize;

use push_domain::QueuedMessage;

/// Wrapper for queue messages with metadata
#[derive(Debug, Clone)]
pub struct QueueMessage<T> {
    /// The message body
    pub body: T,
    /// Receipt handle for acknowledging or rejecting the message
    pub receipt_handle: String,
    /// Message ID
    pub message_id: String,
}

/// Configuration for queue operations
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Queue URL
    pub queue_url: String,
    /// Maximum number of messages per poll (bounded prefetch)
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,
    /// Visibility timeout for received messages (seconds)
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout: i32,
    /// Long-polling wait time (seconds)
    #[serde(default = "default_wait_time_seconds")]
    pub wait_time_seconds: i32,
}

const fn default_max_messages() -> i32 {
    10
}

const fn default_visibility_timeout() -> i32 {
    30
}

const fn default_wait_time_seconds() -> i32 {
    1
}

/// Trait for extracting message group ID for FIFO queues
pub trait MessageGroupId {
    /// Returns the message group ID for FIFO queue ordering
    fn message_group_id(&self) -> String;
}

impl MessageGroupId for QueuedMessage {
    fn message_group_id(&self) -> String {
        if self.group_id.is_empty() {
            "msgs".to_string()
        } else {
            self.group_id.clone()
        }
    }
}
