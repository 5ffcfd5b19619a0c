//! Auth Middleware
//!
//! Bearer access-token guard for protected routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::domain::entity::token::TokenIdentity;
use crate::domain::service::TokenProvider;
use crate::error::{AuthError, AuthResult};

/// Middleware state
pub struct AccessTokenState<T> {
    pub tokens: Arc<T>,
}

impl<T> AccessTokenState<T> {
    pub fn new(tokens: Arc<T>) -> Self {
        Self { tokens }
    }
}

impl<T> Clone for AccessTokenState<T> {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
        }
    }
}

/// Identity of the verified access token, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub TokenIdentity);

/// Middleware that requires a valid `Authorization: Bearer <access token>`
pub async fn require_access_token<T>(
    State(state): State<AccessTokenState<T>>,
    mut req: Request<Body>,
    next: Next,
) -> AuthResult<Response>
where
    T: TokenProvider + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::InvalidAccessToken)?;
    let identity = state.tokens.parse_access_token(token)?;

    req.extensions_mut().insert(AuthenticatedAccount(identity));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
