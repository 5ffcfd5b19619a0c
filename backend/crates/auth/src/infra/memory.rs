//! In-Memory Account Repository
//!
//! Process-local store for development and tests. Same contract as the
//! PostgreSQL store, including the `version` compare-and-swap.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::entity::login_attempt::LoginAttempt;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Accounts and login attempts keyed by normalized email
#[derive(Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    attempts: Arc<RwLock<HashMap<String, LoginAttempt>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self.accounts.read().await.get(email.as_str()).cloned())
    }

    async fn create(&self, account: NewAccount) -> AuthResult<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(account.email.as_str()) {
            return Err(AuthError::EmailTaken);
        }

        let account = Account::create(account, Utc::now());
        accounts.insert(account.email.as_str().to_string(), account.clone());
        Ok(account)
    }

    async fn create_with_callback<T, F>(
        &self,
        account: NewAccount,
        on_created: F,
    ) -> AuthResult<(Account, T)>
    where
        F: FnOnce(&Account) -> AuthResult<T> + Send,
        T: Send,
    {
        // Insert, callback and rollback all happen under one guard with no
        // await in between, so nobody observes the account before it commits.
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(account.email.as_str()) {
            return Err(AuthError::EmailTaken);
        }

        let account = Account::create(account, Utc::now());
        let key = account.email.as_str().to_string();
        accounts.insert(key.clone(), account.clone());

        match on_created(&account) {
            Ok(value) => Ok((account, value)),
            Err(e) => {
                accounts.remove(&key);
                Err(e)
            }
        }
    }

    async fn update_lockout_state(&self, account: &Account) -> AuthResult<Account> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .get_mut(account.email.as_str())
            .filter(|stored| stored.id == account.id)
            .ok_or(AuthError::AccountNotFound)?;

        if stored.version != account.version {
            return Err(AuthError::StaleAccount);
        }

        stored.status = account.status;
        stored.failed_login_attempts = account.failed_login_attempts;
        stored.lock_until = account.lock_until;
        stored.lock_escalation_level = account.lock_escalation_level;
        stored.last_failed_login_at = account.last_failed_login_at;
        stored.updated_at = account.updated_at;
        stored.version += 1;

        Ok(stored.clone())
    }

    async fn find_login_attempt(&self, email: &Email) -> AuthResult<Option<LoginAttempt>> {
        Ok(self.attempts.read().await.get(email.as_str()).cloned())
    }

    async fn save_login_attempt(&self, attempt: &LoginAttempt) -> AuthResult<LoginAttempt> {
        let mut attempts = self.attempts.write().await;
        let current = attempts
            .get(attempt.email.as_str())
            .map_or(0, |stored| stored.version);
        if current != attempt.version {
            return Err(AuthError::StaleAccount);
        }

        let stored = LoginAttempt {
            version: current + 1,
            ..attempt.clone()
        };
        attempts.insert(attempt.email.as_str().to_string(), stored.clone());
        Ok(stored)
    }
}
