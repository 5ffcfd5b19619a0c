//! API DTOs (Data Transfer Objects)
//!
//! Field names are snake_case on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::entity::account::Account;
use crate::domain::entity::token::{TokenIdentity, TokenPair};

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub id: String,
}

impl From<&Account> for RegisterResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
        }
    }
}

// ============================================================================
// Login / Refresh
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Clone, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

// ============================================================================
// Google
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct GoogleLoginResponse {
    pub auth_url: String,
}

/// Query string Google redirects back with
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleCallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

// ============================================================================
// Current Account
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl From<&TokenIdentity> for MeResponse {
    fn from(identity: &TokenIdentity) -> Self {
        Self {
            id: identity.id.to_string(),
            email: identity.email.as_str().to_string(),
            role: identity.role.code().to_string(),
        }
    }
}
