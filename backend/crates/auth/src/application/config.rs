//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::fmt;
use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

pub use crate::domain::entity::account::LockoutPolicy;

/// Default `iss` claim
pub const DEFAULT_TOKEN_ISSUER: &str = "hexagon-api";

/// Default `aud` claim
pub const DEFAULT_TOKEN_AUDIENCE: &str = "hexagon-clients";

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 week)
    pub refresh_token_ttl: Duration,
    pub token_issuer: String,
    pub token_audience: String,
    /// Consecutive failures before the account is locked
    pub max_failed_attempts: u32,
    /// Lock duration (15 minutes)
    pub lock_duration: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Cookie carrying the OAuth anti-CSRF state
    pub oauth_state_cookie_name: String,
    /// OAuth state cookie lifetime (5 minutes)
    pub oauth_state_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            token_issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            token_audience: DEFAULT_TOKEN_AUDIENCE.to_string(),
            max_failed_attempts: 5,
            lock_duration: Duration::from_secs(15 * 60),
            password_pepper: None,
            oauth_state_cookie_name: "oauth_state".to_string(),
            oauth_state_ttl: Duration::from_secs(5 * 60),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret (for development)
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failed_attempts: self.max_failed_attempts.max(1),
            lock_duration: chrono::Duration::from_std(self.lock_duration)
                .unwrap_or(chrono::Duration::MAX),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("token_issuer", &self.token_issuer)
            .field("token_audience", &self.token_audience)
            .field("max_failed_attempts", &self.max_failed_attempts)
            .field("lock_duration", &self.lock_duration)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("oauth_state_cookie_name", &self.oauth_state_cookie_name)
            .field("oauth_state_ttl", &self.oauth_state_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .finish()
    }
}

/// Google OAuth client settings
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Per-request timeout for the token and userinfo calls
    pub timeout: Duration,
}

impl GoogleOAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// All three credentials are present
    pub fn is_complete(&self) -> bool {
        [&self.client_id, &self.client_secret, &self.redirect_url]
            .iter()
            .all(|v| !v.trim().is_empty())
    }
}

impl fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_url", &self.redirect_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
