//! Refresh Use Case
//!
//! Trades a valid refresh token for a new pair. Trust is stateless: the
//! presented token is not revoked and stays usable until it expires.

use std::sync::Arc;

use crate::application::tokens::issue_token_pair;
use crate::domain::entity::token::TokenPair;
use crate::domain::service::TokenProvider;
use crate::error::{AuthError, AuthResult};

pub struct RefreshUseCase<T>
where
    T: TokenProvider,
{
    tokens: Arc<T>,
}

impl<T> RefreshUseCase<T>
where
    T: TokenProvider,
{
    pub fn new(tokens: Arc<T>) -> Self {
        Self { tokens }
    }

    pub fn execute(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let identity = self
            .tokens
            .parse_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let pair = issue_token_pair(self.tokens.as_ref(), &identity)?;

        tracing::debug!(account_id = %identity.id, "Token pair refreshed");

        Ok(pair)
    }
}
