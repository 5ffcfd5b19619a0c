//! Cryptographic Utilities
//!
//! Every random secret in the backend comes from here: token ids, the OAuth
//! anti-CSRF state, filler passwords for federated accounts and generated
//! display names. All of them draw from the OS RNG.

use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A zero-length secret was requested
    #[error("random secret length must be positive")]
    EmptyLength,
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// `len` random bytes encoded as URL-safe base64 without padding.
///
/// The encoded string is `ceil(len * 4 / 3)` characters long.
pub fn random_token(len: usize) -> Result<String, CryptoError> {
    if len == 0 {
        return Err(CryptoError::EmptyLength);
    }
    Ok(to_base64_url(&random_bytes(len)))
}

/// Encode bytes as URL-safe base64 (no padding)
pub fn to_base64_url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64 (no padding)
pub fn from_base64_url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s)
}
