//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are rendered by the
//! auth crate.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use auth::domain::repository::AccountRepository;
use auth::presentation::AuthAppState;
use auth::{
    Argon2PasswordHasher, GoogleOAuthProvider, InMemoryAccountRepository, JwtTokenProvider,
    PgAccountRepository, auth_router,
};
use axum::{
    Router, http,
    http::{Method, header},
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ApiConfig, StoreKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    tracing::info!(env = ?config.env, store = ?config.store, "Configuration loaded");

    match config.store {
        StoreKind::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            serve(config, PgAccountRepository::new(pool)).await
        }
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory account store; accounts are lost on restart");
            serve(config, InMemoryAccountRepository::new()).await
        }
    }
}

async fn serve<R>(config: ApiConfig, repo: R) -> anyhow::Result<()>
where
    R: AccountRepository + Sync + 'static,
{
    let hasher = Argon2PasswordHasher::new(config.auth.pepper());
    let tokens = JwtTokenProvider::from_config(&config.auth)?;

    let oauth = match config.google.clone() {
        Some(google) => {
            let provider = GoogleOAuthProvider::new(google)?;
            tracing::info!("Google sign-in enabled");
            Some(Arc::new(provider))
        }
        None => {
            tracing::info!("Google sign-in not configured");
            None
        }
    };

    let state = AuthAppState::new(
        Arc::new(repo),
        Arc::new(hasher),
        Arc::new(tokens),
        oauth,
        config.auth,
    );

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
