//! Auth (Account Security) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Account entity, lockout transitions, repository and service traits
//! - `application/` - Use cases: register, login, refresh, Google sign-in
//! - `infra/` - PostgreSQL and in-memory stores, Argon2, JWT, Google OAuth
//! - `presentation/` - HTTP handlers, DTOs, router, bearer-token middleware
//!
//! ## Features
//! - Email + password sign-in with progressive account lockout
//! - Stateless HS256 access/refresh token pairs
//! - Google sign-in (authorization code flow) with account linking by email
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Lockout state written with a compare-and-swap on the account version
//! - A federated account is never left behind without its first token pair
//! - OAuth `state` pinned in an HttpOnly cookie and checked on callback

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::{AuthConfig, GoogleOAuthConfig};
pub use error::{AuthError, AuthResult};
pub use infra::{
    Argon2PasswordHasher, GoogleOAuthProvider, InMemoryAccountRepository, JwtTokenProvider,
    PgAccountRepository,
};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::memory::InMemoryAccountRepository as MemoryStore;
    pub use crate::infra::postgres::PgAccountRepository as PgStore;
}
