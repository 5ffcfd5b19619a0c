//! Argon2 Password Hasher
//!
//! Runs Argon2id on the blocking pool; a hash costs tens of milliseconds and
//! would otherwise stall the async workers.

use std::sync::Arc;

use platform::password::{ClearTextPassword, HashedPassword};

use crate::domain::service::PasswordHasher;
use crate::domain::value_object::password_hash::PasswordHash;
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    pepper: Option<Arc<[u8]>>,
}

impl Argon2PasswordHasher {
    pub fn new(pepper: Option<&[u8]>) -> Self {
        Self {
            pepper: pepper.map(Arc::from),
        }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: ClearTextPassword) -> AuthResult<PasswordHash> {
        let pepper = self.pepper.clone();

        let hashed = tokio::task::spawn_blocking(move || password.hash(pepper.as_deref()))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))??;

        Ok(PasswordHash::new(hashed.as_phc_string()))
    }

    async fn verify(&self, hash: &PasswordHash, password: ClearTextPassword) -> AuthResult<bool> {
        let Ok(stored) = HashedPassword::from_phc_string(hash.as_str()) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return Ok(false);
        };
        let pepper = self.pepper.clone();

        tokio::task::spawn_blocking(move || stored.verify(&password, pepper.as_deref()))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))
    }
}
