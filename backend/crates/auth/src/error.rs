//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Too many failed attempts; locked until the given instant
    #[error("Account is temporarily locked")]
    AccountLocked { until: DateTime<Utc> },

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Invalid access token")]
    InvalidAccessToken,

    #[error("OAuth provider is not configured")]
    OAuthNotConfigured,

    #[error("OAuth state is required")]
    MissingState,

    #[error("OAuth code is required")]
    MissingCode,

    /// Callback `state` does not match the state cookie
    #[error("Invalid OAuth state")]
    StateMismatch,

    #[error("OAuth provider did not return an email")]
    MissingEmail,

    /// Provider returned an identity that cannot become an account
    #[error("Invalid OAuth user")]
    InvalidOAuthUser,

    #[error("OAuth email is not verified")]
    UnverifiedEmail,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Account not found")]
    AccountNotFound,

    /// A conditional lockout write lost against a concurrent writer
    #[error("Account was modified concurrently")]
    StaleAccount,

    /// Input validation error
    #[error("{0}")]
    Validation(String),

    /// Token exchange or userinfo failure at the OAuth provider
    #[error("OAuth provider error: {0}")]
    OAuthProvider(String),

    /// Token signing failure
    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidAccessToken
            | AuthError::StateMismatch
            | AuthError::MissingEmail
            | AuthError::InvalidOAuthUser
            | AuthError::UnverifiedEmail => ErrorKind::Unauthorized,
            AuthError::AccountLocked { .. } => ErrorKind::TooManyRequests,
            AuthError::OAuthNotConfigured => ErrorKind::NotImplemented,
            AuthError::MissingState | AuthError::MissingCode | AuthError::Validation(_) => {
                ErrorKind::BadRequest
            }
            AuthError::EmailTaken | AuthError::StaleAccount => ErrorKind::Conflict,
            AuthError::AccountNotFound => ErrorKind::NotFound,
            AuthError::OAuthProvider(_)
            | AuthError::Token(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures get a generic message so internals never reach the client.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::AccountLocked { until } => AppError::too_many_requests(self.to_string())
                .with_action(format!("Try again after {}", until.to_rfc3339())),
            AuthError::OAuthProvider(_) => AppError::internal("OAuth login failed"),
            _ if self.kind() == ErrorKind::InternalServerError => {
                AppError::internal("Internal server error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) | AuthError::Token(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::OAuthProvider(msg) => {
                tracing::error!(message = %msg, "OAuth provider error");
            }
            AuthError::AccountLocked { until } => {
                tracing::warn!(locked_until = %until, "Login attempt on locked account");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        match self {
            // The kernel conversion tells unavailable databases (503) apart from bugs (500)
            AuthError::Database(e) => AppError::from(e).into_response(),
            other => other.to_app_error().into_response(),
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest | ErrorKind::UnprocessableEntity => {
                AuthError::Validation(err.message().to_string())
            }
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::crypto::CryptoError> for AuthError {
    fn from(err: platform::crypto::CryptoError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
