//! Google Sign-In Use Case
//!
//! Builds the consent URL and turns an authorization code into a token pair,
//! linking to the account with the same email or creating one.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::tokens::issue_token_pair;
use crate::domain::entity::account::NewAccount;
use crate::domain::entity::oauth_user::OAuthUser;
use crate::domain::entity::token::{TokenIdentity, TokenPair};
use crate::domain::repository::AccountRepository;
use crate::domain::service::{OAuthProvider, PasswordHasher, TokenProvider};
use crate::domain::value_object::{display_name::DisplayName, email::Email};
use crate::error::{AuthError, AuthResult};

/// Random bytes in the unusable password of a federated account
const FEDERATED_PASSWORD_BYTES: usize = 32;

pub struct GoogleAuthUseCase<R, H, T, O>
where
    R: AccountRepository,
    H: PasswordHasher,
    T: TokenProvider,
    O: OAuthProvider,
{
    repo: Arc<R>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    provider: Option<Arc<O>>,
}

impl<R, H, T, O> GoogleAuthUseCase<R, H, T, O>
where
    R: AccountRepository,
    H: PasswordHasher,
    T: TokenProvider,
    O: OAuthProvider,
{
    /// `provider` is `None` when OAuth is not configured on this deployment
    pub fn new(repo: Arc<R>, hasher: Arc<H>, tokens: Arc<T>, provider: Option<Arc<O>>) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            provider,
        }
    }

    fn provider(&self) -> AuthResult<&O> {
        self.provider
            .as_deref()
            .ok_or(AuthError::OAuthNotConfigured)
    }

    /// Consent URL for `state`
    pub fn auth_url(&self, state: &str) -> AuthResult<String> {
        let provider = self.provider()?;
        if state.trim().is_empty() {
            return Err(AuthError::MissingState);
        }
        Ok(provider.auth_code_url(state))
    }

    /// Exchange `code` and sign the verified identity in
    pub async fn login(&self, code: &str) -> AuthResult<TokenPair> {
        let provider = self.provider()?;
        if code.trim().is_empty() {
            return Err(AuthError::MissingCode);
        }

        let oauth_user = provider.exchange(code).await?;
        if oauth_user.email.trim().is_empty() {
            return Err(AuthError::MissingEmail);
        }
        if !oauth_user.email_verified {
            return Err(AuthError::UnverifiedEmail);
        }

        let email = Email::new(&oauth_user.email).map_err(|_| AuthError::InvalidOAuthUser)?;

        if let Some(account) = self.repo.find_by_email(&email).await? {
            tracing::info!(account_id = %account.id, "Account signed in with Google");
            return issue_token_pair(self.tokens.as_ref(), &TokenIdentity::from(&account));
        }

        match self.create_account(email.clone(), &oauth_user).await {
            Err(AuthError::EmailTaken) => {
                // Lost a race with a concurrent first sign-in for the same email
                let account = self
                    .repo
                    .find_by_email(&email)
                    .await?
                    .ok_or(AuthError::AccountNotFound)?;
                issue_token_pair(self.tokens.as_ref(), &TokenIdentity::from(&account))
            }
            other => other,
        }
    }

    /// Create the federated account; the token pair is issued inside the
    /// creation so a signing failure leaves no account behind.
    async fn create_account(&self, email: Email, oauth_user: &OAuthUser) -> AuthResult<TokenPair> {
        let filler = platform::crypto::random_token(FEDERATED_PASSWORD_BYTES)?;
        let password_hash = self
            .hasher
            .hash(ClearTextPassword::unchecked(filler))
            .await?;
        let name = DisplayName::from_provider(oauth_user.name.as_deref())?;

        let tokens = self.tokens.clone();
        let (account, pair) = self
            .repo
            .create_with_callback(NewAccount::user(name, email, password_hash), move |created| {
                issue_token_pair(tokens.as_ref(), &TokenIdentity::from(created))
            })
            .await?;

        tracing::info!(account_id = %account.id, "Account created from Google sign-in");

        Ok(pair)
    }
}
