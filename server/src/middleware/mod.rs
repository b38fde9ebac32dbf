pub mod identity;

pub use identity::{require_caller_identity, CallerIdentity};
