//! Display Name Value Object
//!
//! Free-form name shown to people. Not an identifier: it need not be unique.
//!
//! ## Invariants
//! - NFKC normalized, surrounding whitespace trimmed
//! - 1..=100 characters
//! - No control characters

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AuthError, AuthResult};

/// Maximum length for display name (in characters)
pub const DISPLAY_NAME_MAX_LENGTH: usize = 100;

/// Prefix of names generated for federated accounts without a usable name
const GENERATED_NAME_PREFIX: &str = "user_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(raw: &str) -> AuthResult<Self> {
        let normalized: String = raw.nfkc().collect();
        let name = normalized.trim();

        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if name.chars().count() > DISPLAY_NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Name must be at most {} characters",
                DISPLAY_NAME_MAX_LENGTH
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AuthError::Validation(
                "Name contains invalid characters".to_string(),
            ));
        }

        Ok(Self(name.to_string()))
    }

    /// `user_` followed by 16 random bytes (URL-safe base64)
    pub fn generate() -> AuthResult<Self> {
        let suffix = platform::crypto::random_token(16)?;
        Ok(Self(format!("{GENERATED_NAME_PREFIX}{suffix}")))
    }

    /// The provider's name when usable, a generated one otherwise
    pub fn from_provider(name: Option<&str>) -> AuthResult<Self> {
        match name.map(Self::new) {
            Some(Ok(name)) => Ok(name),
            _ => Self::generate(),
        }
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
