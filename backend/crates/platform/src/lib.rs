//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Secure random byte strings (token ids, OAuth state, generated secrets)
//! - Password hashing (Argon2id) and password policy
//! - Cookie helpers

pub mod cookie;
pub mod crypto;
pub mod password;
