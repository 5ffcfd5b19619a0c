//! Login Use Case
//!
//! Email + password sign-in guarded by the lockout tracker.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::ClearTextPassword;

use crate::application::lockout::LockoutTracker;
use crate::application::tokens::issue_token_pair;
use crate::domain::entity::account::LockoutPolicy;
use crate::domain::entity::token::{TokenIdentity, TokenPair};
use crate::domain::repository::AccountRepository;
use crate::domain::service::{PasswordHasher, TokenProvider};
use crate::domain::value_object::{email::Email, password_hash::PasswordHash};
use crate::error::{AuthError, AuthResult};

/// Argon2id hash (default parameters) of no password anyone holds. Checked
/// when the email has no account so both paths pay the same hashing cost.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<R, H, T>
where
    R: AccountRepository,
    H: PasswordHasher,
    T: TokenProvider,
{
    repo: Arc<R>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    lockout: LockoutTracker<R>,
}

impl<R, H, T> LoginUseCase<R, H, T>
where
    R: AccountRepository,
    H: PasswordHasher,
    T: TokenProvider,
{
    pub fn new(repo: Arc<R>, hasher: Arc<H>, tokens: Arc<T>, policy: LockoutPolicy) -> Self {
        Self {
            lockout: LockoutTracker::new(repo.clone(), policy),
            repo,
            hasher,
            tokens,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<TokenPair> {
        self.execute_at(input, Utc::now()).await
    }

    /// Sign in as of `now`.
    ///
    /// A locked account is rejected before the password is looked at. A wrong
    /// password is recorded (and persisted) before `InvalidCredentials` is
    /// returned. An email with no account fails the same way and locks on the
    /// same schedule.
    pub async fn execute_at(&self, input: LoginInput, now: DateTime<Utc>) -> AuthResult<TokenPair> {
        // Malformed emails cannot belong to an account
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let password = ClearTextPassword::unchecked(input.password);

        let Some(account) = self.repo.find_by_email(&email).await? else {
            return self.reject_unknown(&email, password, now).await;
        };

        let account = self.lockout.evaluate(account, now).await?;

        let matched = self.hasher.verify(&account.password_hash, password).await?;

        if !matched {
            self.lockout.record_failure(account, now).await?;
            return Err(AuthError::InvalidCredentials);
        }

        let account = self.lockout.record_success(account, now).await?;
        let pair = issue_token_pair(self.tokens.as_ref(), &TokenIdentity::from(&account))?;

        tracing::info!(account_id = %account.id, "Account signed in");

        Ok(pair)
    }

    async fn reject_unknown(
        &self,
        email: &Email,
        password: ClearTextPassword,
        now: DateTime<Utc>,
    ) -> AuthResult<TokenPair> {
        let attempt = self.lockout.evaluate_unknown(email, now).await?;

        self.hasher
            .verify(&PasswordHash::new(DUMMY_PASSWORD_HASH), password)
            .await?;

        self.lockout.record_unknown_failure(attempt, now).await?;
        Err(AuthError::InvalidCredentials)
    }
}
