//! Server Configuration
//!
//! Read once at startup from the environment (after `.env` is loaded).

use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, GoogleOAuthConfig};

const DEFAULT_PORT: u16 = 8088;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> anyhow::Result<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("development") | Some("dev") => Ok(Self::Development),
            Some("production") | Some("prod") => Ok(Self::Production),
            Some(other) => bail!("APP_ENV must be development or production, got {other:?}"),
        }
    }
}

/// Account store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl StoreKind {
    fn parse(value: Option<&str>) -> anyhow::Result<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("postgres") => Ok(Self::Postgres),
            Some("memory") => Ok(Self::Memory),
            Some(other) => bail!("ACCOUNT_STORE must be postgres or memory, got {other:?}"),
        }
    }
}

#[derive(Debug)]
pub struct ApiConfig {
    pub env: AppEnv,
    pub port: u16,
    pub store: StoreKind,
    /// Required for the postgres store
    pub database_url: Option<String>,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    /// `None` when the Google credentials are not all set
    pub google: Option<GoogleOAuthConfig>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = AppEnv::parse(var("APP_ENV").as_deref())?;
        let store = StoreKind::parse(var("ACCOUNT_STORE").as_deref())?;

        let port = match var("PORT") {
            Some(port) => port.trim().parse().context("PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        let database_url = var("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when ACCOUNT_STORE is postgres");
        }

        let mut auth = match (env, var("AUTH_JWT_SECRET")) {
            (_, Some(secret)) => AuthConfig {
                jwt_secret: secret.into_bytes(),
                ..AuthConfig::default()
            },
            (AppEnv::Development, None) => AuthConfig::development(),
            (AppEnv::Production, None) => bail!("AUTH_JWT_SECRET must be set in production"),
        };
        auth.cookie_secure = env == AppEnv::Production;
        auth.password_pepper = var("AUTH_PASSWORD_PEPPER").map(String::into_bytes);
        if let Some(ttl) = var("AUTH_TOKEN_TTL") {
            auth.access_token_ttl = seconds(&ttl, "AUTH_TOKEN_TTL")?;
        }
        if let Some(ttl) = var("AUTH_REFRESH_TTL") {
            auth.refresh_token_ttl = seconds(&ttl, "AUTH_REFRESH_TTL")?;
        }
        if let Some(max) = var("AUTH_MAX_FAILED_ATTEMPTS") {
            auth.max_failed_attempts = max
                .trim()
                .parse()
                .ok()
                .filter(|&max: &u32| max > 0)
                .context("AUTH_MAX_FAILED_ATTEMPTS must be a positive number")?;
        }
        if let Some(duration) = var("AUTH_LOCK_DURATION") {
            auth.lock_duration = seconds(&duration, "AUTH_LOCK_DURATION")?;
        }

        let google = GoogleOAuthConfig::new(
            var("AUTH_GOOGLE_CLIENT_ID").unwrap_or_default(),
            var("AUTH_GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            var("AUTH_GOOGLE_REDIRECT_URL").unwrap_or_default(),
        );
        let google = google.is_complete().then_some(google);

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            env,
            port,
            store,
            database_url,
            frontend_origins,
            auth,
            google,
        })
    }
}

fn seconds(value: &str, key: &str) -> anyhow::Result<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number of seconds"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
