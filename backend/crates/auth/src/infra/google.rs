//! Google OAuth Provider
//!
//! Authorization-code flow against Google: consent URL, code exchange on the
//! token endpoint, then the v2 userinfo endpoint for the identity.

use serde::{Deserialize, Deserializer, Serialize};

use crate::application::config::GoogleOAuthConfig;
use crate::domain::entity::oauth_user::OAuthUser;
use crate::domain::service::OAuthProvider;
use crate::error::{AuthError, AuthResult};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "openid email profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuthConfigError {
    #[error("Google OAuth needs a client id, client secret and redirect URL")]
    MissingCredentials,
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub struct GoogleOAuthProvider {
    config: GoogleOAuthConfig,
    client: reqwest::Client,
}

impl GoogleOAuthProvider {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, OAuthConfigError> {
        if !config.is_complete() {
            return Err(OAuthConfigError::MissingCredentials);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, client })
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&TokenRequest {
                code,
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                redirect_uri: &self.config.redirect_url,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| AuthError::OAuthProvider(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthProvider(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::OAuthProvider(format!("invalid token response: {e}")))?;

        Ok(tokens.access_token)
    }

    async fn fetch_user(&self, access_token: &str) -> AuthResult<OAuthUser> {
        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::OAuthProvider(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::OAuthProvider(format!(
                "userinfo endpoint returned {status}"
            )));
        }

        let info: GoogleUserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::OAuthProvider(format!("invalid userinfo response: {e}")))?;

        Ok(info.into())
    }
}

impl OAuthProvider for GoogleOAuthProvider {
    fn auth_code_url(&self, state: &str) -> String {
        format!(
            "{AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline",
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    async fn exchange(&self, code: &str) -> AuthResult<OAuthUser> {
        let access_token = self.exchange_code(code).await?;
        let user = self.fetch_user(&access_token).await?;

        tracing::debug!(email_verified = user.email_verified, "Google identity fetched");

        Ok(user)
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    verified_email: FlexibleBool,
}

impl From<GoogleUserInfo> for OAuthUser {
    fn from(info: GoogleUserInfo) -> Self {
        Self {
            email: info.email,
            name: info.name,
            email_verified: info.verified_email.0,
        }
    }
}

/// Boolean that also accepts the loose encodings seen in the wild:
/// `null`, quoted booleans (`"true"`, `"1"`, `"F"`, ...) and integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlexibleBool(pub bool);

impl<'de> Deserialize<'de> for FlexibleBool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = match &value {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => parse_bool(s.trim())
                .ok_or_else(|| D::Error::custom(format!("invalid boolean string: {s:?}")))?,
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(|n| n != 0)
                .ok_or_else(|| D::Error::custom(format!("invalid boolean number: {n}")))?,
            other => return Err(D::Error::custom(format!("invalid boolean: {other}"))),
        };

        Ok(Self(parsed))
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
