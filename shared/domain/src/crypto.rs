//! Ed25519 identity helpers
//!
//! Account ids and space ids are base58-encoded Ed25519 public keys. All
//! signature checks in the service go through [`verify`], which treats a
//! malformed signature the same as a failed verification.

use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH};
use thiserror::Error;

/// Errors decoding an account address or raw public key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("account address is not valid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("public key must be {PUBLIC_KEY_LENGTH} bytes, got {0}")]
    Length(usize),

    #[error("bytes do not form a valid Ed25519 public key")]
    Invalid(#[from] ed25519_dalek::SignatureError),
}

/// Derives the account address (base58 of the public key) for a key.
#[must_use]
pub fn account_address(key: &VerifyingKey) -> String {
    bs58::encode(key.as_bytes()).into_string()
}

/// Decodes a base58 account address back into its public key.
///
/// # Errors
///
/// Returns [`KeyError`] when the address is not base58 or not a valid key.
pub fn decode_account_address(address: &str) -> Result<VerifyingKey, KeyError> {
    let bytes = bs58::decode(address).into_vec()?;
    public_key_from_bytes(&bytes)
}

/// Parses raw bytes into an Ed25519 public key.
///
/// # Errors
///
/// Returns [`KeyError`] on a wrong length or an invalid curve point.
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey, KeyError> {
    let arr: [u8; PUBLIC_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| KeyError::Length(bytes.len()))?;
    Ok(VerifyingKey::from_bytes(&arr)?)
}

/// Verifies `signature` over `message` under `key`.
///
/// Malformed signature bytes verify as `false` rather than erroring; the
/// distinction is never useful to callers.
#[must_use]
pub fn verify(key: &VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}
