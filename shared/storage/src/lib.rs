//! Storage layer for the push fan-out service
//!
//! Account/topic, token and space repositories over DynamoDB, plus the
//! durable SQS message queue that decouples notification ingestion from
//! delivery. Repositories are stateless wrappers over the SDK clients;
//! concurrency is delegated to the SDK connection pool.

#![deny(clippy::all, dead_code)]

pub mod account;
pub mod queue;
pub mod space;
pub mod token;

pub use account::{AccountRepo, AccountStorage};
pub use queue::{MessageQueue, SqsQueue};
pub use space::{SpaceRepo, SpaceStorage};
pub use token::{TokenRepo, TokenStorage};
