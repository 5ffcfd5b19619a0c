//! PostgreSQL Account Repository

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::entity::login_attempt::LoginAttempt;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    account_id::AccountId, account_status::AccountStatus, display_name::DisplayName,
    email::Email, password_hash::PasswordHash, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Unique index on `accounts.email`
const EMAIL_UNIQUE_CONSTRAINT: &str = "accounts_email_key";

const ACCOUNT_COLUMNS: &str = r#"
    id,
    name,
    email,
    password_hash,
    role,
    status,
    failed_login_attempts,
    lock_until,
    lock_escalation_level,
    last_failed_login_at,
    version,
    created_at,
    updated_at
"#;

const LOGIN_ATTEMPT_COLUMNS: &str = r#"
    email,
    failed_login_attempts,
    lock_until,
    last_failed_login_at,
    version
"#;

/// PostgreSQL-backed account store
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(conn: &mut PgConnection, account: &Account) -> AuthResult<Account> {
        let sql = format!(
            r#"
            INSERT INTO accounts ({ACCOUNT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account.id.as_uuid())
            .bind(account.name.as_str())
            .bind(account.email.as_str())
            .bind(account.password_hash.as_str())
            .bind(account.role.code())
            .bind(account.status.code())
            .bind(to_db_count(account.failed_login_attempts))
            .bind(account.lock_until)
            .bind(to_db_count(account.lock_escalation_level))
            .bind(account.last_failed_login_at)
            .bind(account.version)
            .bind(account.created_at)
            .bind(account.updated_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_insert_error)?;

        row.into_account()
    }
}

impl AccountRepository for PgAccountRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn create(&self, account: NewAccount) -> AuthResult<Account> {
        let account = Account::create(account, Utc::now());
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, &account).await
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
        let account = Account::create(account, Utc::now());

        // Dropping the transaction without commit rolls the insert back
        let mut tx = self.pool.begin().await?;
        let stored = Self::insert(&mut tx, &account).await?;
        let value = on_created(&stored)?;
        tx.commit().await?;

        Ok((stored, value))
    }

    async fn update_lockout_state(&self, account: &Account) -> AuthResult<Account> {
        let sql = format!(
            r#"
            UPDATE accounts SET
                status = $3,
                failed_login_attempts = $4,
                lock_until = $5,
                lock_escalation_level = $6,
                last_failed_login_at = $7,
                updated_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account.id.as_uuid())
            .bind(account.version)
            .bind(account.status.code())
            .bind(to_db_count(account.failed_login_attempts))
            .bind(account.lock_until)
            .bind(to_db_count(account.lock_escalation_level))
            .bind(account.last_failed_login_at)
            .bind(account.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.into_account(),
            None => Err(AuthError::StaleAccount),
        }
    }

    async fn find_login_attempt(&self, email: &Email) -> AuthResult<Option<LoginAttempt>> {
        let sql = format!("SELECT {LOGIN_ATTEMPT_COLUMNS} FROM login_attempts WHERE email = $1");

        let row = sqlx::query_as::<_, LoginAttemptRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_login_attempt()).transpose()
    }

    async fn save_login_attempt(&self, attempt: &LoginAttempt) -> AuthResult<LoginAttempt> {
        // First failure inserts; a rival insert hits the conflict and gets no row
        let sql = if attempt.version == 0 {
            format!(
                r#"
                INSERT INTO login_attempts ({LOGIN_ATTEMPT_COLUMNS})
                VALUES ($1, $2, $3, $4, 1)
                ON CONFLICT (email) DO NOTHING
                RETURNING {LOGIN_ATTEMPT_COLUMNS}
                "#
            )
        } else {
            format!(
                r#"
                UPDATE login_attempts SET
                    failed_login_attempts = $2,
                    lock_until = $3,
                    last_failed_login_at = $4,
                    version = version + 1
                WHERE email = $1 AND version = $5
                RETURNING {LOGIN_ATTEMPT_COLUMNS}
                "#
            )
        };

        let mut query = sqlx::query_as::<_, LoginAttemptRow>(&sql)
            .bind(attempt.email.as_str())
            .bind(to_db_count(attempt.failed_login_attempts))
            .bind(attempt.lock_until)
            .bind(attempt.last_failed_login_at);
        if attempt.version != 0 {
            query = query.bind(attempt.version);
        }

        match query.fetch_optional(&self.pool).await? {
            Some(row) => row.into_login_attempt(),
            None => Err(AuthError::StaleAccount),
        }
    }
}

fn map_insert_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) {
            return AuthError::EmailTaken;
        }
    }
    AuthError::Database(err)
}

fn to_db_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_db_count(value: i32, column: &str) -> AuthResult<u32> {
    u32::try_from(value).map_err(|_| AuthError::Internal(format!("Negative {column}: {value}")))
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    status: String,
    failed_login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    lock_escalation_level: i32,
    last_failed_login_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;
        let status = AccountStatus::from_code(&self.status)
            .ok_or_else(|| AuthError::Internal(format!("Invalid status: {}", self.status)))?;

        Ok(Account {
            id: AccountId::from_uuid(self.id),
            name: DisplayName::from_db(self.name),
            email: Email::from_db(self.email),
            password_hash: PasswordHash::new(self.password_hash),
            role,
            status,
            failed_login_attempts: from_db_count(
                self.failed_login_attempts,
                "failed_login_attempts",
            )?,
            lock_until: self.lock_until,
            lock_escalation_level: from_db_count(
                self.lock_escalation_level,
                "lock_escalation_level",
            )?,
            last_failed_login_at: self.last_failed_login_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LoginAttemptRow {
    email: String,
    failed_login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    last_failed_login_at: Option<DateTime<Utc>>,
    version: i64,
}

impl LoginAttemptRow {
    fn into_login_attempt(self) -> AuthResult<LoginAttempt> {
        Ok(LoginAttempt {
            email: Email::from_db(self.email),
            failed_login_attempts: from_db_count(
                self.failed_login_attempts,
                "failed_login_attempts",
            )?,
            lock_until: self.lock_until,
            last_failed_login_at: self.last_failed_login_at,
            version: self.version,
        })
    }
}
