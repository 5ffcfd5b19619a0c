//! Domain Layer
//!
//! Contains entities, value objects, repository and service traits.

pub mod entity;
pub mod repository;
pub mod service;
pub mod value_object;

// Re-exports
pub use entity::account::{Account, LockCheck, LockoutPolicy, NewAccount};
pub use entity::oauth_user::OAuthUser;
pub use entity::token::{TokenIdentity, TokenKind, TokenPair};
pub use repository::AccountRepository;
pub use service::{OAuthProvider, PasswordHasher, TokenProvider};
