//! JWT Token Provider
//!
//! HS256 access and refresh tokens. Both kinds carry the same claim set and
//! differ in `type` and lifetime:
//!
//! `iss`, `aud`, `sub` (account id), `jti` (24 random bytes), `iat`, `nbf`,
//! `exp`, `type` (`access` | `refresh`), `user_id` (mirror of `sub`),
//! `email`, `role`.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::token::{TokenIdentity, TokenKind};
use crate::domain::service::TokenProvider;
use crate::domain::value_object::{account_id::AccountId, email::Email, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Random bytes in a token id
const JTI_BYTES: usize = 24;

#[derive(Debug, Serialize)]
struct IssuedClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    sub: String,
    jti: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    #[serde(rename = "type")]
    kind: &'static str,
    user_id: String,
    email: &'a str,
    role: &'static str,
}

/// Claims as read back. Signature, `exp`, `nbf`, `iss` and `aud` are
/// checked by `jsonwebtoken`; the rest by `JwtTokenProvider::parse`.
#[derive(Debug, Deserialize)]
struct ReceivedClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    jti: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

pub struct JwtTokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenProvider {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::Internal(
                "JWT signing secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: crate::application::config::DEFAULT_TOKEN_ISSUER.to_string(),
            audience: crate::application::config::DEFAULT_TOKEN_AUDIENCE.to_string(),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        Ok(Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )?
        .with_issuer(config.token_issuer.clone())
        .with_audience(config.token_audience.clone()))
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    fn generate(&self, identity: &TokenIdentity, kind: TokenKind) -> AuthResult<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = IssuedClaims {
            iss: &self.issuer,
            aud: &self.audience,
            sub: identity.id.to_string(),
            jti: platform::crypto::random_token(JTI_BYTES)?,
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl_secs),
            kind: kind.as_str(),
            user_id: identity.id.to_string(),
            email: identity.email.as_str(),
            role: identity.role.code(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Token(e.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);
        validation
    }

    /// Verify `token` as a `kind` token. The error says why; callers collapse
    /// it into the public rejection.
    fn parse(&self, token: &str, kind: TokenKind) -> Result<TokenIdentity, String> {
        let claims = decode::<ReceivedClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| e.to_string())?
            .claims;

        if claims.kind.as_deref() != Some(kind.as_str()) {
            return Err(format!("token type is not {kind}"));
        }
        if claims.jti.as_deref().is_none_or(str::is_empty) {
            return Err("missing token id".to_string());
        }

        let subject = claims
            .sub
            .filter(|s| !s.is_empty())
            .or(claims.user_id.filter(|s| !s.is_empty()))
            .ok_or("missing subject")?;
        let id: AccountId = subject
            .parse()
            .map_err(|_| "subject is not an account id".to_string())?;

        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or("missing email")?;
        let email = Email::new(email).map_err(|_| "invalid email claim".to_string())?;

        Ok(TokenIdentity {
            id,
            email,
            role: UserRole::from_claim(claims.role.as_deref()),
        })
    }
}

impl TokenProvider for JwtTokenProvider {
    fn generate_access_token(&self, identity: &TokenIdentity) -> AuthResult<String> {
        self.generate(identity, TokenKind::Access)
    }

    fn generate_refresh_token(&self, identity: &TokenIdentity) -> AuthResult<String> {
        self.generate(identity, TokenKind::Refresh)
    }

    fn parse_refresh_token(&self, token: &str) -> AuthResult<TokenIdentity> {
        self.parse(token, TokenKind::Refresh).map_err(|reason| {
            tracing::debug!(%reason, "Refresh token rejected");
            AuthError::InvalidRefreshToken
        })
    }

    fn parse_access_token(&self, token: &str) -> AuthResult<TokenIdentity> {
        self.parse(token, TokenKind::Access).map_err(|reason| {
            tracing::debug!(%reason, "Access token rejected");
            AuthError::InvalidAccessToken
        })
    }
}
