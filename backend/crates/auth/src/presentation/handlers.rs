//! HTTP Handlers

use axum::extract::{Extension, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use platform::cookie::CookieConfig;

use crate::application::config::AuthConfig;
use crate::application::{
    GoogleAuthUseCase, LoginInput, LoginUseCase, RefreshUseCase, RegisterInput, RegisterUseCase,
};
use crate::domain::repository::AccountRepository;
use crate::domain::service::{OAuthProvider, PasswordHasher, TokenProvider};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    GoogleCallbackQuery, GoogleLoginResponse, LoginRequest, MeResponse, RefreshRequest,
    RegisterRequest, RegisterResponse, TokenPairResponse,
};
use crate::presentation::middleware::AuthenticatedAccount;

/// Random bytes in an OAuth `state` value
const OAUTH_STATE_BYTES: usize = 32;

/// Shared state for auth handlers
pub struct AuthAppState<R, H, T, O> {
    pub repo: Arc<R>,
    pub hasher: Arc<H>,
    pub tokens: Arc<T>,
    /// `None` when Google sign-in is not configured
    pub oauth: Option<Arc<O>>,
    pub config: Arc<AuthConfig>,
}

impl<R, H, T, O> AuthAppState<R, H, T, O> {
    pub fn new(
        repo: Arc<R>,
        hasher: Arc<H>,
        tokens: Arc<T>,
        oauth: Option<Arc<O>>,
        config: AuthConfig,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            oauth,
            config: Arc::new(config),
        }
    }

    fn state_cookie(&self) -> CookieConfig {
        CookieConfig::new(self.config.oauth_state_cookie_name.clone())
            .with_secure(self.config.cookie_secure)
            .with_same_site(self.config.cookie_same_site)
            .with_max_age(self.config.oauth_state_ttl)
    }
}

// Manual impl: a derive would require the type parameters to be `Clone`
impl<R, H, T, O> Clone for AuthAppState<R, H, T, O> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            hasher: self.hasher.clone(),
            tokens: self.tokens.clone(),
            oauth: self.oauth.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, H, T, O>(
    State(state): State<AuthAppState<R, H, T, O>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<RegisterResponse>)>
where
    R: AccountRepository + Sync + 'static,
    H: PasswordHasher + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.hasher.clone());

    let account = use_case
        .execute(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(&account))))
}

// ============================================================================
// Login / Refresh
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, H, T, O>(
    State(state): State<AuthAppState<R, H, T, O>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<TokenPairResponse>>
where
    R: AccountRepository + Sync + 'static,
    H: PasswordHasher + Sync + 'static,
    T: TokenProvider + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.hasher.clone(),
        state.tokens.clone(),
        state.config.lockout_policy(),
    );

    let pair = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(pair.into()))
}

/// POST /api/auth/refresh
pub async fn refresh<R, H, T, O>(
    State(state): State<AuthAppState<R, H, T, O>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<TokenPairResponse>>
where
    T: TokenProvider + 'static,
{
    let pair = RefreshUseCase::new(state.tokens.clone()).execute(&req.refresh_token)?;
    Ok(Json(pair.into()))
}

// ============================================================================
// Google
// ============================================================================

/// GET /api/auth/google/login
///
/// Issues a fresh `state`, pins it in a short-lived cookie and returns the
/// consent URL carrying it.
pub async fn google_login<R, H, T, O>(
    State(state): State<AuthAppState<R, H, T, O>>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + Sync + 'static,
    H: PasswordHasher + Sync + 'static,
    T: TokenProvider + 'static,
    O: OAuthProvider + Sync + 'static,
{
    let oauth_state = platform::crypto::random_token(OAUTH_STATE_BYTES)?;
    let auth_url = google_use_case(&state).auth_url(&oauth_state)?;

    let cookie = state
        .state_cookie()
        .set_cookie_header(&oauth_state)
        .ok_or_else(|| AuthError::Internal("Invalid OAuth state cookie".to_string()))?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(GoogleLoginResponse { auth_url }),
    ))
}

/// GET /api/auth/google/callback
pub async fn google_callback<R, H, T, O>(
    State(state): State<AuthAppState<R, H, T, O>>,
    headers: HeaderMap,
    Query(query): Query<GoogleCallbackQuery>,
) -> AuthResult<impl IntoResponse>
where
    R: AccountRepository + Sync + 'static,
    H: PasswordHasher + Sync + 'static,
    T: TokenProvider + 'static,
    O: OAuthProvider + Sync + 'static,
{
    let code = query.code.filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode)?;
    let oauth_state = query
        .state
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::MissingState)?;

    let cookie_config = state.state_cookie();
    let pinned = platform::cookie::extract_cookie(&headers, &cookie_config.name);
    if pinned.as_deref() != Some(oauth_state.as_str()) {
        return Err(AuthError::StateMismatch);
    }

    let pair = google_use_case(&state).login(&code).await?;

    let clear = cookie_config
        .delete_cookie_header()
        .ok_or_else(|| AuthError::Internal("Invalid OAuth state cookie".to_string()))?;

    Ok((
        [(header::SET_COOKIE, clear)],
        Json(TokenPairResponse::from(pair)),
    ))
}

fn google_use_case<R, H, T, O>(state: &AuthAppState<R, H, T, O>) -> GoogleAuthUseCase<R, H, T, O>
where
    R: AccountRepository,
    H: PasswordHasher,
    T: TokenProvider,
    O: OAuthProvider,
{
    GoogleAuthUseCase::new(
        state.repo.clone(),
        state.hasher.clone(),
        state.tokens.clone(),
        state.oauth.clone(),
    )
}

// ============================================================================
// Current Account
// ============================================================================

/// GET /api/auth/me (behind `require_access_token`)
pub async fn me(Extension(account): Extension<AuthenticatedAccount>) -> Json<MeResponse> {
    Json(MeResponse::from(&account.0))
}
