//! Password Hashing and Verification
//!
//! - Argon2id hashing (PHC string format) with optional pepper
//! - Zeroization of clear text on drop
//! - Account password policy: 9..=72 characters with upper case, lower case,
//!   digit and special character classes

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 9;

/// Maximum password length (characters)
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password is required")]
    Required,

    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one number")]
    MissingNumber,

    #[error("Password must contain at least one special character")]
    MissingSpecialCharacter,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, zeroized on drop.
///
/// Not `Clone`; `Debug` output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a password for a new account, enforcing the policy.
    ///
    /// Unicode is normalized using NFKC before validation.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.is_empty() {
            return Err(PasswordPolicyError::Required);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized.chars().any(char::is_control) {
            return Err(PasswordPolicyError::InvalidCharacter);
        }
        if !normalized.chars().any(char::is_uppercase) {
            return Err(PasswordPolicyError::MissingUppercase);
        }
        if !normalized.chars().any(char::is_lowercase) {
            return Err(PasswordPolicyError::MissingLowercase);
        }
        if !normalized.chars().any(char::is_numeric) {
            return Err(PasswordPolicyError::MissingNumber);
        }
        if !normalized
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            return Err(PasswordPolicyError::MissingSpecialCharacter);
        }

        Ok(Self(normalized))
    }

    /// Wrap a password without applying the policy.
    ///
    /// For sign-in attempts (a wrong password must reach the verifier so the
    /// failure is counted) and for generated secrets.
    pub fn unchecked(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    /// Borrow the clear text. Never log or persist it.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Vec<u8> {
        let mut bytes = self.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }

    /// Hash the password using Argon2id (m=19456, t=2, p=1)
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let mut password_bytes = self.peppered(pepper);
        let salt = SaltString::generate(OsRng);

        let result = Argon2::default()
            .hash_password(&password_bytes, &salt)
            .map(|hash| HashedPassword {
                hash: hash.to_string(),
            })
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()));

        password_bytes.zeroize();
        result
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash.
    ///
    /// The pepper must match the one used during hashing. Argon2 compares in
    /// constant time.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        let mut password_bytes = password.peppered(pepper);
        let matched = Argon2::default()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok();
        password_bytes.zeroize();
        matched
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(raw: &str) -> Result<ClearTextPassword, PasswordPolicyError> {
        ClearTextPassword::new(raw.to_string())
    }

    #[test]
    fn test_password_required() {
        assert!(matches!(policy(""), Err(PasswordPolicyError::Required)));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            policy("Ab1!abcd"),
            Err(PasswordPolicyError::TooShort { min: 9, actual: 8 })
        ));
        let long = format!("Ab1!{}", "a".repeat(MAX_PASSWORD_LENGTH));
        assert!(matches!(
            policy(&long),
            Err(PasswordPolicyError::TooLong { max: 72, .. })
        ));
    }

    #[test]
    fn test_password_character_classes() {
        assert_eq!(
            policy("lowercase1!").unwrap_err(),
            PasswordPolicyError::MissingUppercase
        );
        assert_eq!(
            policy("UPPERCASE1!").unwrap_err(),
            PasswordPolicyError::MissingLowercase
        );
        assert_eq!(
            policy("NoDigits!!").unwrap_err(),
            PasswordPolicyError::MissingNumber
        );
        assert_eq!(
            policy("NoSpecial12").unwrap_err(),
            PasswordPolicyError::MissingSpecialCharacter
        );
    }

    #[test]
    fn test_password_control_character() {
        assert_eq!(
            policy("Valid1!\u{0007}pass").unwrap_err(),
            PasswordPolicyError::InvalidCharacter
        );
    }

    #[test]
    fn test_valid_password() {
        assert!(policy("Secret#Pass2024").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::unchecked("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        assert!(hashed.verify(&password, None));

        let wrong_password = ClearTextPassword::unchecked("WrongPassword123!".to_string());
        assert!(!hashed.verify(&wrong_password, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::unchecked("TestPassword123!".to_string());
        let pepper = b"my_secret_pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_restore() {
        let password = ClearTextPassword::unchecked("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::unchecked("secret".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
