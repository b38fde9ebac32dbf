//! Delivery metrics recorded through the `metrics` facade

use ::metrics::{describe_counter, describe_histogram, Unit};

/// Total number of provider dispatch operations.
pub const SEND_COUNT: &str = "push_sender_send_count";

/// Total number of tokens handed to providers.
pub const SEND_TOKENS: &str = "push_sender_send_tokens";

/// Seconds between message creation and provider dispatch, per platform.
pub const SEND_DURATION: &str = "push_sender_send_duration_seconds";

/// Registers metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(SEND_COUNT, "total count of send operations");
    describe_counter!(SEND_TOKENS, "total count of tokens sent");
    describe_histogram!(
        SEND_DURATION,
        Unit::Seconds,
        "time from enqueue to provider dispatch"
    );
}
