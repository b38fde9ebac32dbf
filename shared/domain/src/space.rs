//! Registered spaces

use serde::{Deserialize, Serialize};

/// A registered space: the base58 space key plus the account that proved
/// possession of the space's private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub author: String,
    pub created: i64,
}
