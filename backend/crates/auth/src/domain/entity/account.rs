//! Account Entity
//!
//! Identity, credentials and the progressive lockout counters of one account.
//! The lockout transitions here are pure: they take `now` and mutate the
//! value. Persisting them (with the `version` compare-and-swap) is the job of
//! `application::lockout::LockoutTracker`.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    account_id::AccountId, account_status::AccountStatus, display_name::DisplayName,
    email::Email, password_hash::PasswordHash, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Lockout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that engage the lock
    pub max_failed_attempts: u32,
    /// How long an engaged lock lasts
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lock_duration: Duration::minutes(15),
        }
    }
}

/// Result of checking the lock at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheck {
    /// No lock in place
    Open,
    /// Locked until the given instant
    Locked { until: DateTime<Utc> },
    /// A lock was in place but has run out; it must be cleared
    Expired,
}

/// Fields needed to create an account; the store assigns nothing else
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: DisplayName,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub role: UserRole,
    pub status: AccountStatus,
}

impl NewAccount {
    /// Active account with the `user` role
    pub fn user(name: DisplayName, email: Email, password_hash: PasswordHash) -> Self {
        Self {
            name,
            email,
            password_hash,
            role: UserRole::User,
            status: AccountStatus::Active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: DisplayName,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub role: UserRole,
    pub status: AccountStatus,
    pub failed_login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub lock_escalation_level: u32,
    pub last_failed_login_at: Option<DateTime<Utc>>,
    /// Compare-and-swap guard, bumped by every lockout write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Materialize a new account with a fresh id and clean counters
    pub fn create(new: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            status: new.status,
            failed_login_attempts: 0,
            lock_until: None,
            lock_escalation_level: 0,
            last_failed_login_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn lock_check(&self, now: DateTime<Utc>) -> LockCheck {
        match self.lock_until {
            Some(until) if until > now => LockCheck::Locked { until },
            Some(_) => LockCheck::Expired,
            None if self.status.is_locked() => LockCheck::Expired,
            None => LockCheck::Open,
        }
    }

    /// Lift an expired lock: counters reset, status back to active.
    /// The escalation level is history and stays.
    pub fn clear_lock(&mut self, now: DateTime<Utc>) {
        self.failed_login_attempts = 0;
        self.lock_until = None;
        self.last_failed_login_at = None;
        if self.status.is_locked() {
            self.status = AccountStatus::Active;
        }
        self.updated_at = now;
    }

    /// Count a failed password attempt. Returns `true` when this failure
    /// engaged the lock.
    pub fn register_failure(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        self.failed_login_attempts += 1;
        self.last_failed_login_at = Some(now);
        self.updated_at = now;

        if self.failed_login_attempts < policy.max_failed_attempts {
            return false;
        }

        self.failed_login_attempts = 0;
        self.lock_until = Some(
            now.checked_add_signed(policy.lock_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        self.lock_escalation_level += 1;
        self.status = AccountStatus::Locked;
        true
    }

    /// Reset the failure counter after a successful sign-in. Returns `true`
    /// when anything changed and needs persisting.
    pub fn register_success(&mut self, now: DateTime<Utc>) -> bool {
        if self.failed_login_attempts == 0 && self.last_failed_login_at.is_none() {
            return false;
        }
        self.failed_login_attempts = 0;
        self.last_failed_login_at = None;
        self.updated_at = now;
        true
    }

    /// Check the lockout invariants before a write
    pub fn validate_lock_state(&self, now: DateTime<Utc>) -> AuthResult<()> {
        let lock_active = self.lock_until.is_some_and(|until| until > now);
        if self.status.is_locked() != lock_active {
            return Err(AuthError::Internal(format!(
                "invalid lock state: status={} lock_until={:?}",
                self.status, self.lock_until
            )));
        }

        if self.failed_login_attempts > 0 {
            match self.last_failed_login_at {
                Some(at) if at <= now => {}
                _ => {
                    return Err(AuthError::Internal(format!(
                        "invalid failed login state: attempts={} last_failed_login_at={:?}",
                        self.failed_login_attempts, self.last_failed_login_at
                    )));
                }
            }
        }

        Ok(())
    }
}
