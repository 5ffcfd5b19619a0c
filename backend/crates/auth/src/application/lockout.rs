//! Account Lockout Tracker
//!
//! Applies the `Account` lockout transitions and persists them with a
//! compare-and-swap on `version`. A write that loses the race reloads the row
//! and re-applies the same transition to the fresh state. Emails with no
//! account get the same treatment through their `LoginAttempt` record.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entity::account::{Account, LockCheck, LockoutPolicy};
use crate::domain::entity::login_attempt::LoginAttempt;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Conditional write attempts per transition
pub const LOCKOUT_MAX_RETRIES: usize = 3;

pub struct LockoutTracker<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    policy: LockoutPolicy,
}

impl<R> LockoutTracker<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, policy: LockoutPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Gate a sign-in attempt.
    ///
    /// A live lock is `AccountLocked`; an expired one is cleared and
    /// persisted before the attempt proceeds.
    pub async fn evaluate(&self, account: Account, now: DateTime<Utc>) -> AuthResult<Account> {
        match account.lock_check(now) {
            LockCheck::Open => return Ok(account),
            LockCheck::Locked { until } => return Err(AuthError::AccountLocked { until }),
            LockCheck::Expired => {}
        }

        let account = self
            .apply(account, now, |account| match account.lock_check(now) {
                LockCheck::Expired => {
                    account.clear_lock(now);
                    Ok(true)
                }
                LockCheck::Locked { until } => Err(AuthError::AccountLocked { until }),
                LockCheck::Open => Ok(false),
            })
            .await?;

        tracing::info!(account_id = %account.id, "Expired account lock cleared");
        Ok(account)
    }

    /// Count a failed password attempt, engaging the lock at the threshold
    pub async fn record_failure(&self, account: Account, now: DateTime<Utc>) -> AuthResult<Account> {
        let policy = self.policy;
        let account = self
            .apply(account, now, |account| {
                // A concurrent failure already engaged the lock
                if let LockCheck::Locked { .. } = account.lock_check(now) {
                    return Ok(false);
                }
                account.register_failure(&policy, now);
                Ok(true)
            })
            .await?;

        if let LockCheck::Locked { until } = account.lock_check(now) {
            tracing::warn!(
                account_id = %account.id,
                locked_until = %until,
                escalation_level = account.lock_escalation_level,
                "Account locked after repeated failed sign-ins"
            );
        } else {
            tracing::debug!(
                account_id = %account.id,
                failed_login_attempts = account.failed_login_attempts,
                "Failed sign-in recorded"
            );
        }

        Ok(account)
    }

    /// Reset the failure counter; writes only when there is something to reset
    pub async fn record_success(&self, account: Account, now: DateTime<Utc>) -> AuthResult<Account> {
        self.apply(account, now, |account| Ok(account.register_success(now)))
            .await
    }

    /// Gate a sign-in against an email with no account. A live lock on its
    /// attempt record is `AccountLocked`, as it would be for an account.
    pub async fn evaluate_unknown(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginAttempt> {
        let attempt = self.load_attempt(email).await?;
        match attempt.lock_check(now) {
            LockCheck::Locked { until } => Err(AuthError::AccountLocked { until }),
            LockCheck::Open | LockCheck::Expired => Ok(attempt),
        }
    }

    /// Count a failed sign-in against an email with no account
    pub async fn record_unknown_failure(
        &self,
        mut attempt: LoginAttempt,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginAttempt> {
        for retry in 1..=LOCKOUT_MAX_RETRIES {
            // A concurrent failure already engaged the lock
            if let LockCheck::Locked { .. } = attempt.lock_check(now) {
                return Ok(attempt);
            }
            let locked = attempt.register_failure(&self.policy, now);

            match self.repo.save_login_attempt(&attempt).await {
                Ok(stored) => {
                    if locked {
                        tracing::warn!("Unknown email locked after repeated failed sign-ins");
                    }
                    return Ok(stored);
                }
                Err(AuthError::StaleAccount) if retry < LOCKOUT_MAX_RETRIES => {
                    tracing::debug!(attempt = retry, "Login attempt write lost a race, reloading");
                    attempt = self.load_attempt(&attempt.email).await?;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::StaleAccount)
    }

    async fn load_attempt(&self, email: &Email) -> AuthResult<LoginAttempt> {
        Ok(self
            .repo
            .find_login_attempt(email)
            .await?
            .unwrap_or_else(|| LoginAttempt::new(email.clone())))
    }

    /// Run `transition` and persist the result, retrying on stale writes.
    ///
    /// `transition` returns `Ok(false)` when there is nothing to write.
    async fn apply<F>(
        &self,
        mut account: Account,
        now: DateTime<Utc>,
        mut transition: F,
    ) -> AuthResult<Account>
    where
        F: FnMut(&mut Account) -> AuthResult<bool> + Send,
    {
        for attempt in 1..=LOCKOUT_MAX_RETRIES {
            if !transition(&mut account)? {
                return Ok(account);
            }
            account.validate_lock_state(now)?;

            match self.repo.update_lockout_state(&account).await {
                Ok(stored) => return Ok(stored),
                Err(AuthError::StaleAccount) if attempt < LOCKOUT_MAX_RETRIES => {
                    tracing::debug!(
                        account_id = %account.id,
                        attempt,
                        "Lockout write lost a race, reloading"
                    );
                    account = self
                        .repo
                        .find_by_email(&account.email)
                        .await?
                        .ok_or(AuthError::AccountNotFound)?;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::StaleAccount)
    }
}
