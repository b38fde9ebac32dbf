//! Core domain types for the push fan-out service
//!
//! Shared between the RPC surface, the storage layer and the sender pool:
//! topics and their space keys, device tokens, spaces, queued messages and
//! the Ed25519 identity helpers.

#![deny(clippy::all, dead_code)]

pub mod crypto;
pub mod message;
pub mod space;
pub mod token;
pub mod topic;

pub use message::{PushMessage, QueuedMessage};
pub use space::Space;
pub use token::{Platform, Token, TokenStatus};
pub use topic::Topic;
