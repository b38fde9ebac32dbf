//! The push RPC service core: verify, authorize, mutate or enqueue.

mod service;

pub use service::{PushError, PushService};
