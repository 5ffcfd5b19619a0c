//! Service Traits
//!
//! Collaborators the use cases depend on: password hashing, token
//! signing/verification and the OAuth identity provider.

use platform::password::ClearTextPassword;

use crate::domain::entity::{oauth_user::OAuthUser, token::TokenIdentity};
use crate::domain::value_object::password_hash::PasswordHash;
use crate::error::AuthResult;

/// Password hashing
#[trait_variant::make(PasswordHasher: Send)]
pub trait LocalPasswordHasher {
    async fn hash(&self, password: ClearTextPassword) -> AuthResult<PasswordHash>;

    /// `Ok(false)` on mismatch; `Err` only when hashing itself fails
    async fn verify(&self, hash: &PasswordHash, password: ClearTextPassword) -> AuthResult<bool>;
}

/// Token signing and verification.
///
/// Synchronous: tokens are issued inside `create_with_callback`, which runs
/// its callback without awaiting.
pub trait TokenProvider: Send + Sync {
    fn generate_access_token(&self, identity: &TokenIdentity) -> AuthResult<String>;

    fn generate_refresh_token(&self, identity: &TokenIdentity) -> AuthResult<String>;

    /// Every rejection is `AuthError::InvalidRefreshToken`
    fn parse_refresh_token(&self, token: &str) -> AuthResult<TokenIdentity>;

    /// Every rejection is `AuthError::InvalidAccessToken`
    fn parse_access_token(&self, token: &str) -> AuthResult<TokenIdentity>;
}

/// OAuth 2.0 authorization-code provider
#[trait_variant::make(OAuthProvider: Send)]
pub trait LocalOAuthProvider {
    /// Consent URL carrying `state`
    fn auth_code_url(&self, state: &str) -> String;

    /// Trade an authorization code for the user's identity
    async fn exchange(&self, code: &str) -> AuthResult<OAuthUser>;
}
