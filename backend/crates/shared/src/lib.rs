//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary every backend crate agrees on:
//! - The error classification ([`error::kind::ErrorKind`]) and the unified
//!   [`error::app_error::AppError`] rendered at the HTTP boundary
//! - Typed identifiers ([`id::Id`])
//!
//! Nothing here knows about accounts, tokens or OAuth.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
