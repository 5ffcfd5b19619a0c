//! Register Use Case
//!
//! Creates a password account.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::domain::entity::account::{Account, NewAccount};
use crate::domain::repository::AccountRepository;
use crate::domain::service::PasswordHasher;
use crate::domain::value_object::{display_name::DisplayName, email::Email};
use crate::error::AuthResult;

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<R, H>
where
    R: AccountRepository,
    H: PasswordHasher,
{
    repo: Arc<R>,
    hasher: Arc<H>,
}

impl<R, H> RegisterUseCase<R, H>
where
    R: AccountRepository,
    H: PasswordHasher,
{
    pub fn new(repo: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repo, hasher }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<Account> {
        let name = DisplayName::new(&input.name)?;
        let email = Email::new(&input.email)?;
        let password = ClearTextPassword::new(input.password)?;

        let password_hash = self.hasher.hash(password).await?;
        let account = self
            .repo
            .create(NewAccount::user(name, email, password_hash))
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");

        Ok(account)
    }
}
