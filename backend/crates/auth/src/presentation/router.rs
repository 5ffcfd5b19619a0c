//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::repository::AccountRepository;
use crate::domain::service::{OAuthProvider, PasswordHasher, TokenProvider};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AccessTokenState, require_access_token};

/// Auth routes, to be nested under `/api/auth`
pub fn auth_router<R, H, T, O>(state: AuthAppState<R, H, T, O>) -> Router
where
    R: AccountRepository + Sync + 'static,
    H: PasswordHasher + Sync + 'static,
    T: TokenProvider + 'static,
    O: OAuthProvider + Sync + 'static,
{
    let guard = AccessTokenState::new(state.tokens.clone());

    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            guard,
            require_access_token::<T>,
        ));

    Router::new()
        .route("/register", post(handlers::register::<R, H, T, O>))
        .route("/login", post(handlers::login::<R, H, T, O>))
        .route("/refresh", post(handlers::refresh::<R, H, T, O>))
        .route("/google/login", get(handlers::google_login::<R, H, T, O>))
        .route(
            "/google/callback",
            get(handlers::google_callback::<R, H, T, O>),
        )
        .with_state(state)
        .merge(protected)
}
