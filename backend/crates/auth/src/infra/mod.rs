//! Infrastructure Layer
//!
//! Account stores, the Argon2 hasher, JWT signing and the Google OAuth client.

pub mod google;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod postgres;

pub use google::{GoogleOAuthProvider, OAuthConfigError};
pub use jwt::JwtTokenProvider;
pub use memory::InMemoryAccountRepository;
pub use password::Argon2PasswordHasher;
pub use postgres::PgAccountRepository;
