//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod google;
pub mod lockout;
pub mod login;
pub mod refresh;
pub mod register;
pub mod tokens;

// Re-exports
pub use config::{AuthConfig, GoogleOAuthConfig};
pub use google::GoogleAuthUseCase;
pub use lockout::{LOCKOUT_MAX_RETRIES, LockoutTracker};
pub use login::{LoginInput, LoginUseCase};
pub use refresh::RefreshUseCase;
pub use register::{RegisterInput, RegisterUseCase};
pub use tokens::issue_token_pair;
