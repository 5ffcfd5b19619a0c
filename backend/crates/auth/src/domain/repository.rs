//! Repository Traits
//!
//! Interfaces for account persistence. Implementations live in the
//! infrastructure layer (`infra::postgres`, `infra::memory`); which one runs is
//! decided by configuration at startup.

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::entity::login_attempt::LoginAttempt;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Account store
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Find an account by its normalized email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Create an account. A taken email is `AuthError::EmailTaken`.
    async fn create(&self, account: NewAccount) -> AuthResult<Account>;

    /// Create an account and run `on_created` against it as one unit.
    ///
    /// When `on_created` fails, the account does not survive: the error is
    /// returned and a later `find_by_email` sees nothing. Dropping the returned
    /// future before it completes has the same effect.
    async fn create_with_callback<T, F>(
        &self,
        account: NewAccount,
        on_created: F,
    ) -> AuthResult<(Account, T)>
    where
        F: FnOnce(&Account) -> AuthResult<T> + Send,
        T: Send;

    /// Persist the lockout fields of `account` if, and only if, the stored
    /// row still carries `account.version`.
    ///
    /// Returns the stored account with its bumped version, or
    /// `AuthError::StaleAccount` when another writer got there first.
    async fn update_lockout_state(&self, account: &Account) -> AuthResult<Account>;

    /// Failure record for an email with no account
    async fn find_login_attempt(&self, email: &Email) -> AuthResult<Option<LoginAttempt>>;

    /// Store `attempt` if the stored record still carries `attempt.version`
    /// (a version of 0 expects no record). Returns the stored record with its
    /// bumped version, or `AuthError::StaleAccount`.
    async fn save_login_attempt(&self, attempt: &LoginAttempt) -> AuthResult<LoginAttempt>;
}
