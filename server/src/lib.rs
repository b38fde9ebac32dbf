//! Push fan-out server
//!
//! The RPC surface of the service: authenticated peers register device
//! tokens, manage space-scoped topic subscriptions and broadcast signed
//! payloads, which are verified, filtered and enqueued for the sender
//! pool.

#![deny(clippy::all, dead_code)]

pub mod config;
pub mod debug;
pub mod middleware;
pub mod push;
pub mod routes;
pub mod server;
pub mod types;
