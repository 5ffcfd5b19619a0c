//! Login Attempt Entity
//!
//! Failure counter for an email that has no account. Sign-ins against such an
//! email lock on the same schedule as a real account, so the two cannot be
//! told apart by their responses.

use chrono::{DateTime, Utc};

use crate::domain::entity::account::{LockCheck, LockoutPolicy};
use crate::domain::value_object::email::Email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub email: Email,
    pub failed_login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_failed_login_at: Option<DateTime<Utc>>,
    /// Compare-and-swap guard; 0 means not stored yet
    pub version: i64,
}

impl LoginAttempt {
    pub fn new(email: Email) -> Self {
        Self {
            email,
            failed_login_attempts: 0,
            lock_until: None,
            last_failed_login_at: None,
            version: 0,
        }
    }

    pub fn lock_check(&self, now: DateTime<Utc>) -> LockCheck {
        match self.lock_until {
            Some(until) if until > now => LockCheck::Locked { until },
            Some(_) => LockCheck::Expired,
            None => LockCheck::Open,
        }
    }

    /// Count a failure, lifting an expired lock first. Returns `true` when
    /// this failure engaged the lock.
    pub fn register_failure(&mut self, policy: &LockoutPolicy, now: DateTime<Utc>) -> bool {
        if self.lock_check(now) == LockCheck::Expired {
            self.failed_login_attempts = 0;
            self.lock_until = None;
        }

        self.failed_login_attempts += 1;
        self.last_failed_login_at = Some(now);

        if self.failed_login_attempts < policy.max_failed_attempts {
            return false;
        }

        self.failed_login_attempts = 0;
        self.lock_until = Some(
            now.checked_add_signed(policy.lock_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        true
    }
}
