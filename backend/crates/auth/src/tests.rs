//! End-to-end tests over the use cases and the HTTP router, wired to the
//! in-memory store, the real JWT provider and fake hasher/OAuth collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use platform::password::ClearTextPassword;
use tower::ServiceExt;

use crate::application::{
    AuthConfig, GoogleAuthUseCase, GoogleOAuthConfig, LockoutTracker, LoginInput, LoginUseCase,
    RefreshUseCase, RegisterInput, RegisterUseCase,
};
use crate::domain::entity::account::{Account, LockoutPolicy, NewAccount};
use crate::domain::entity::login_attempt::LoginAttempt;
use crate::domain::entity::oauth_user::OAuthUser;
use crate::domain::entity::token::TokenIdentity;
use crate::domain::repository::AccountRepository;
use crate::domain::service::{OAuthProvider, PasswordHasher, TokenProvider};
use crate::domain::value_object::{
    account_status::AccountStatus, display_name::DisplayName, email::Email,
    password_hash::PasswordHash, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};
use crate::infra::{GoogleOAuthProvider, InMemoryAccountRepository, JwtTokenProvider};
use crate::presentation::{AuthAppState, auth_router};

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "Correct-Horse-9";
const WRONG_PASSWORD: &str = "Wrong-Horse-9";

// ============================================================================
// Fakes
// ============================================================================

/// Stores the password in the clear; hashing cost is irrelevant here
#[derive(Default)]
struct FakeHasher;

impl PasswordHasher for FakeHasher {
    async fn hash(&self, password: ClearTextPassword) -> AuthResult<PasswordHash> {
        Ok(PasswordHash::new(format!("plain:{}", password.expose_secret())))
    }

    async fn verify(&self, hash: &PasswordHash, password: ClearTextPassword) -> AuthResult<bool> {
        Ok(hash.as_str() == format!("plain:{}", password.expose_secret()))
    }
}

struct FakeOAuthProvider {
    user: OAuthUser,
    exchanges: AtomicUsize,
}

impl FakeOAuthProvider {
    fn new(user: OAuthUser) -> Self {
        Self {
            user,
            exchanges: AtomicUsize::new(0),
        }
    }

    fn verified(email: &str) -> Self {
        Self::new(OAuthUser {
            email: email.to_string(),
            name: Some("Ada Lovelace".to_string()),
            email_verified: true,
        })
    }
}

impl OAuthProvider for FakeOAuthProvider {
    fn auth_code_url(&self, state: &str) -> String {
        format!("https://accounts.example.com/auth?state={state}")
    }

    async fn exchange(&self, code: &str) -> AuthResult<OAuthUser> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == "revoked" {
            return Err(AuthError::OAuthProvider("invalid_grant".to_string()));
        }
        Ok(self.user.clone())
    }
}

/// Token provider whose signing always fails
struct BrokenSigner;

impl TokenProvider for BrokenSigner {
    fn generate_access_token(&self, _: &TokenIdentity) -> AuthResult<String> {
        Err(AuthError::Token("signing key unavailable".to_string()))
    }

    fn generate_refresh_token(&self, _: &TokenIdentity) -> AuthResult<String> {
        Err(AuthError::Token("signing key unavailable".to_string()))
    }

    fn parse_refresh_token(&self, _: &str) -> AuthResult<TokenIdentity> {
        Err(AuthError::InvalidRefreshToken)
    }

    fn parse_access_token(&self, _: &str) -> AuthResult<TokenIdentity> {
        Err(AuthError::InvalidAccessToken)
    }
}

/// In-memory store that can simulate a concurrent writer
#[derive(Default)]
struct RacingRepository {
    inner: InMemoryAccountRepository,
    /// Lockout writes that a rival failure beats to the row
    rival_failures: AtomicUsize,
    /// Whether a rival creates the same email just before us
    rival_create: AtomicBool,
}

impl AccountRepository for RacingRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        self.inner.find_by_email(email).await
    }

    async fn create(&self, account: NewAccount) -> AuthResult<Account> {
        self.inner.create(account).await
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
        if self.rival_create.swap(false, Ordering::SeqCst) {
            self.inner.create(account.clone()).await?;
        }
        self.inner.create_with_callback(account, on_created).await
    }

    async fn update_lockout_state(&self, account: &Account) -> AuthResult<Account> {
        if self
            .rival_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            let mut rival = self
                .inner
                .find_by_email(&account.email)
                .await?
                .ok_or(AuthError::AccountNotFound)?;
            rival.register_failure(&LockoutPolicy::default(), Utc::now());
            self.inner.update_lockout_state(&rival).await?;
        }
        self.inner.update_lockout_state(account).await
    }

    async fn find_login_attempt(&self, email: &Email) -> AuthResult<Option<LoginAttempt>> {
        self.inner.find_login_attempt(email).await
    }

    async fn save_login_attempt(&self, attempt: &LoginAttempt) -> AuthResult<LoginAttempt> {
        self.inner.save_login_attempt(attempt).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn tokens() -> Arc<JwtTokenProvider> {
    Arc::new(
        JwtTokenProvider::new(
            b"integration-test-secret",
            Duration::from_secs(900),
            Duration::from_secs(3600),
        )
        .unwrap(),
    )
}

async fn seed<R: AccountRepository>(repo: &R, password: &str) -> Account {
    repo.create(NewAccount::user(
        DisplayName::new("Ada").unwrap(),
        Email::new(EMAIL).unwrap(),
        FakeHasher.hash(ClearTextPassword::unchecked(password.to_string())).await.unwrap(),
    ))
    .await
    .unwrap()
}

async fn stored<R: AccountRepository>(repo: &R) -> Account {
    repo.find_by_email(&Email::new(EMAIL).unwrap())
        .await
        .unwrap()
        .unwrap()
}

fn login_use_case<R: AccountRepository>(
    repo: Arc<R>,
) -> LoginUseCase<R, FakeHasher, JwtTokenProvider> {
    LoginUseCase::new(repo, Arc::new(FakeHasher), tokens(), LockoutPolicy::default())
}

fn credentials(password: &str) -> LoginInput {
    LoginInput {
        email: EMAIL.to_string(),
        password: password.to_string(),
    }
}

fn google_use_case(
    repo: Arc<InMemoryAccountRepository>,
    provider: Option<Arc<FakeOAuthProvider>>,
) -> GoogleAuthUseCase<InMemoryAccountRepository, FakeHasher, JwtTokenProvider, FakeOAuthProvider>
{
    GoogleAuthUseCase::new(repo, Arc::new(FakeHasher), tokens(), provider)
}

async fn fail_times<R: AccountRepository>(
    use_case: &LoginUseCase<R, FakeHasher, JwtTokenProvider>,
    times: usize,
    now: DateTime<Utc>,
) {
    for _ in 0..times {
        let err = use_case
            .execute_at(credentials(WRONG_PASSWORD), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials), "got {err:?}");
    }
}

// ============================================================================
// Login & Lockout
// ============================================================================

#[tokio::test]
async fn test_login_issues_token_pair() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let account = seed(repo.as_ref(), PASSWORD).await;

    let pair = login_use_case(repo)
        .execute(credentials(PASSWORD))
        .await
        .unwrap();

    let identity = tokens().parse_refresh_token(&pair.refresh_token).unwrap();
    assert_eq!(identity.id, account.id);
    assert_eq!(identity.email.as_str(), EMAIL);
    assert_eq!(identity.role, UserRole::User);
    assert_eq!(tokens().parse_access_token(&pair.access_token).unwrap().id, account.id);
}

#[tokio::test]
async fn test_unknown_email_is_invalid_credentials() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let use_case = login_use_case(repo.clone());

    let err = use_case
        .execute(LoginInput {
            email: "nobody@example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let err = use_case
        .execute(LoginInput {
            email: "not an email".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_unknown_email_locks_like_an_account() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let use_case = login_use_case(repo.clone());
    let now = Utc::now();

    let attempt = |email: &str| LoginInput {
        email: email.to_string(),
        password: WRONG_PASSWORD.to_string(),
    };

    for n in 1..=6 {
        let known = use_case.execute_at(attempt(EMAIL), now).await.unwrap_err();
        let unknown = use_case
            .execute_at(attempt("ghost@example.com"), now)
            .await
            .unwrap_err();

        assert_eq!(
            std::mem::discriminant(&known),
            std::mem::discriminant(&unknown),
            "attempt {n}: {known:?} vs {unknown:?}"
        );
        assert_eq!(known.to_string(), unknown.to_string());
        if n == 6 {
            assert!(matches!(unknown, AuthError::AccountLocked { .. }), "got {unknown:?}");
        }
    }

    // No account was created for the unknown email
    assert_eq!(repo.len().await, 1);

    let later = now + chrono::Duration::minutes(16);
    let err = use_case
        .execute_at(attempt("ghost@example.com"), later)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    let record = repo
        .find_login_attempt(&Email::new("ghost@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.failed_login_attempts, 1);
    assert_eq!(record.lock_until, None);
}

#[tokio::test]
async fn test_threshold_failures_engage_lock() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let use_case = login_use_case(repo.clone());
    let now = Utc::now();

    fail_times(&use_case, 4, now).await;
    let account = stored(repo.as_ref()).await;
    assert_eq!(account.failed_login_attempts, 4);
    assert_eq!(account.status, AccountStatus::Active);

    fail_times(&use_case, 1, now).await;
    let account = stored(repo.as_ref()).await;
    assert_eq!(account.status, AccountStatus::Locked);
    assert_eq!(account.failed_login_attempts, 0);
    assert_eq!(account.lock_escalation_level, 1);
    assert_eq!(account.lock_until, Some(now + chrono::Duration::minutes(15)));
}

#[tokio::test]
async fn test_locked_account_rejects_even_correct_password() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let use_case = login_use_case(repo.clone());
    let now = Utc::now();

    fail_times(&use_case, 5, now).await;

    let later = now + chrono::Duration::minutes(14);
    for password in [PASSWORD, WRONG_PASSWORD] {
        let err = use_case.execute_at(credentials(password), later).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked { .. }), "got {err:?}");
    }

    // Rejections while locked are not counted
    let account = stored(repo.as_ref()).await;
    assert_eq!(account.failed_login_attempts, 0);
    assert_eq!(account.lock_escalation_level, 1);
}

#[tokio::test]
async fn test_expired_lock_is_cleared_in_the_same_call() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let use_case = login_use_case(repo.clone());
    let now = Utc::now();

    fail_times(&use_case, 5, now).await;

    let after = now + chrono::Duration::minutes(16);
    use_case.execute_at(credentials(PASSWORD), after).await.unwrap();

    let account = stored(repo.as_ref()).await;
    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.lock_until, None);
    assert_eq!(account.failed_login_attempts, 0);
    assert_eq!(account.lock_escalation_level, 1);
}

#[tokio::test]
async fn test_wrong_password_after_expiry_starts_a_fresh_count() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let use_case = login_use_case(repo.clone());
    let now = Utc::now();

    fail_times(&use_case, 5, now).await;
    fail_times(&use_case, 1, now + chrono::Duration::minutes(16)).await;

    let account = stored(repo.as_ref()).await;
    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.failed_login_attempts, 1);
}

#[tokio::test]
async fn test_success_resets_attempts_but_keeps_escalation() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let use_case = login_use_case(repo.clone());
    let now = Utc::now();

    fail_times(&use_case, 5, now).await;
    let after = now + chrono::Duration::minutes(16);
    fail_times(&use_case, 2, after).await;
    use_case.execute_at(credentials(PASSWORD), after).await.unwrap();

    let account = stored(repo.as_ref()).await;
    assert_eq!(account.failed_login_attempts, 0);
    assert_eq!(account.last_failed_login_at, None);
    assert_eq!(account.lock_escalation_level, 1);
}

#[tokio::test]
async fn test_lockout_write_retries_after_losing_a_race() {
    let repo = Arc::new(RacingRepository::default());
    seed(repo.as_ref(), PASSWORD).await;
    repo.rival_failures.store(1, Ordering::SeqCst);

    fail_times(&login_use_case(repo.clone()), 1, Utc::now()).await;

    // The rival's failure and ours both count
    let account = stored(repo.as_ref()).await;
    assert_eq!(account.failed_login_attempts, 2);
    assert_eq!(account.version, 2);
}

#[tokio::test]
async fn test_lockout_gives_up_after_repeated_conflicts() {
    let repo = Arc::new(RacingRepository::default());
    let account = seed(repo.as_ref(), PASSWORD).await;
    repo.rival_failures.store(usize::MAX, Ordering::SeqCst);

    let tracker = LockoutTracker::new(repo.clone(), LockoutPolicy::default());
    let err = tracker.record_failure(account, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AuthError::StaleAccount));
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_trades_for_a_new_pair() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let account = seed(repo.as_ref(), PASSWORD).await;
    let pair = login_use_case(repo).execute(credentials(PASSWORD)).await.unwrap();

    let refreshed = RefreshUseCase::new(tokens())
        .execute(&pair.refresh_token)
        .unwrap();

    assert_ne!(refreshed.refresh_token, pair.refresh_token);
    let identity = tokens().parse_refresh_token(&refreshed.refresh_token).unwrap();
    assert_eq!(identity.id, account.id);
}

#[test]
fn test_refresh_rejects_access_tokens_and_garbage() {
    let identity = TokenIdentity {
        id: Default::default(),
        email: Email::new(EMAIL).unwrap(),
        role: UserRole::Admin,
    };
    let access = tokens().generate_access_token(&identity).unwrap();
    let use_case = RefreshUseCase::new(tokens());

    for token in [access.as_str(), "", "garbage"] {
        assert!(matches!(
            use_case.execute(token),
            Err(AuthError::InvalidRefreshToken)
        ));
    }
}

// ============================================================================
// Register
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let register = RegisterUseCase::new(repo.clone(), Arc::new(FakeHasher));

    let account = register
        .execute(RegisterInput {
            name: "Ada".to_string(),
            email: "Ada@Example.com".to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(account.email.as_str(), EMAIL);
    assert_eq!(account.role, UserRole::User);

    login_use_case(repo).execute(credentials(PASSWORD)).await.unwrap();
}

#[tokio::test]
async fn test_register_rejects_weak_password_and_duplicates() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let register = RegisterUseCase::new(repo.clone(), Arc::new(FakeHasher));
    let input = |password: &str| RegisterInput {
        name: "Ada".to_string(),
        email: EMAIL.to_string(),
        password: password.to_string(),
    };

    let err = register.execute(input("short")).await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    register.execute(input(PASSWORD)).await.unwrap();
    let err = register.execute(input(PASSWORD)).await.unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
    assert_eq!(repo.len().await, 1);
}

// ============================================================================
// Google Sign-In
// ============================================================================

#[test]
fn test_google_auth_url_requires_state() {
    let provider = GoogleOAuthProvider::new(GoogleOAuthConfig::new(
        "client",
        "secret",
        "http://localhost/callback",
    ))
    .unwrap();
    let use_case = GoogleAuthUseCase::new(
        Arc::new(InMemoryAccountRepository::new()),
        Arc::new(FakeHasher),
        tokens(),
        Some(Arc::new(provider)),
    );

    assert!(matches!(use_case.auth_url(""), Err(AuthError::MissingState)));
    assert!(use_case.auth_url("s1").unwrap().contains("state=s1"));
}

#[tokio::test]
async fn test_google_not_configured() {
    let use_case = google_use_case(Arc::new(InMemoryAccountRepository::new()), None);

    assert!(matches!(use_case.auth_url("s1"), Err(AuthError::OAuthNotConfigured)));
    assert!(matches!(
        use_case.login("code").await,
        Err(AuthError::OAuthNotConfigured)
    ));
}

#[tokio::test]
async fn test_google_missing_code_skips_exchange() {
    let provider = Arc::new(FakeOAuthProvider::verified(EMAIL));
    let use_case = google_use_case(Arc::new(InMemoryAccountRepository::new()), Some(provider.clone()));

    assert!(matches!(use_case.login("  ").await, Err(AuthError::MissingCode)));
    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_google_unverified_email_never_signs_in() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    seed(repo.as_ref(), PASSWORD).await;
    let provider = Arc::new(FakeOAuthProvider::new(OAuthUser {
        email: EMAIL.to_string(),
        name: None,
        email_verified: false,
    }));

    let err = google_use_case(repo.clone(), Some(provider))
        .login("code")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UnverifiedEmail));

    let provider = Arc::new(FakeOAuthProvider::new(OAuthUser {
        email: "new@example.com".to_string(),
        name: None,
        email_verified: false,
    }));
    google_use_case(repo.clone(), Some(provider))
        .login("code")
        .await
        .unwrap_err();
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_google_missing_email() {
    let provider = Arc::new(FakeOAuthProvider::new(OAuthUser {
        email: String::new(),
        name: None,
        email_verified: true,
    }));
    let err = google_use_case(Arc::new(InMemoryAccountRepository::new()), Some(provider))
        .login("code")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingEmail));
}

#[tokio::test]
async fn test_google_provider_failure_propagates() {
    let provider = Arc::new(FakeOAuthProvider::verified(EMAIL));
    let err = google_use_case(Arc::new(InMemoryAccountRepository::new()), Some(provider))
        .login("revoked")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::OAuthProvider(_)));
}

#[tokio::test]
async fn test_google_creates_exactly_one_account() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let provider = Arc::new(FakeOAuthProvider::verified("New.User@Example.com"));
    let use_case = google_use_case(repo.clone(), Some(provider));

    let first = use_case.login("code").await.unwrap();
    let second = use_case.login("code").await.unwrap();
    assert_eq!(repo.len().await, 1);

    let a = tokens().parse_refresh_token(&first.refresh_token).unwrap();
    let b = tokens().parse_refresh_token(&second.refresh_token).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.email.as_str(), "new.user@example.com");

    let account = repo
        .find_by_email(&Email::new("new.user@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.name.as_str(), "Ada Lovelace");
    assert_eq!(account.role, UserRole::User);
}

#[tokio::test]
async fn test_google_links_existing_password_account() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let account = seed(repo.as_ref(), PASSWORD).await;
    let provider = Arc::new(FakeOAuthProvider::verified(EMAIL));

    let pair = google_use_case(repo.clone(), Some(provider))
        .login("code")
        .await
        .unwrap();

    let identity = tokens().parse_refresh_token(&pair.refresh_token).unwrap();
    assert_eq!(identity.id, account.id);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_google_generates_name_when_provider_has_none() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let provider = Arc::new(FakeOAuthProvider::new(OAuthUser {
        email: EMAIL.to_string(),
        name: None,
        email_verified: true,
    }));

    google_use_case(repo.clone(), Some(provider))
        .login("code")
        .await
        .unwrap();

    let account = stored(repo.as_ref()).await;
    assert!(account.name.as_str().starts_with("user_"));
}

#[tokio::test]
async fn test_google_signing_failure_leaves_no_account() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let use_case = GoogleAuthUseCase::new(
        repo.clone(),
        Arc::new(FakeHasher),
        Arc::new(BrokenSigner),
        Some(Arc::new(FakeOAuthProvider::verified(EMAIL))),
    );

    let err = use_case.login("code").await.unwrap_err();
    assert!(matches!(err, AuthError::Token(_)));
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_google_concurrent_first_sign_in_reuses_winner() {
    let repo = Arc::new(RacingRepository::default());
    repo.rival_create.store(true, Ordering::SeqCst);
    let use_case = GoogleAuthUseCase::new(
        repo.clone(),
        Arc::new(FakeHasher),
        tokens(),
        Some(Arc::new(FakeOAuthProvider::verified(EMAIL))),
    );

    let pair = use_case.login("code").await.unwrap();

    let winner = stored(repo.as_ref()).await;
    let identity = tokens().parse_refresh_token(&pair.refresh_token).unwrap();
    assert_eq!(identity.id, winner.id);
    assert_eq!(repo.inner.len().await, 1);
}

// ============================================================================
// HTTP
// ============================================================================

fn app(provider: Option<Arc<FakeOAuthProvider>>) -> (Router, Arc<InMemoryAccountRepository>) {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let state = AuthAppState::new(
        repo.clone(),
        Arc::new(FakeHasher),
        tokens(),
        provider,
        AuthConfig::development(),
    );
    (auth_router(state), repo)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, headers, body)
}

fn set_cookie(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_http_register_login_refresh_me() {
    let (app, _) = app(None);

    let (status, _, body) = send(
        &app,
        json_request(
            "/register",
            serde_json::json!({"name": "Ada", "email": EMAIL, "password": PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        &app,
        json_request("/login", serde_json::json!({"email": EMAIL, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();
    assert!(body["access_token"].is_string());

    let (status, _, body) = send(
        &app,
        json_request("/refresh", serde_json::json!({"refresh_token": refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let req = Request::get("/me")
        .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["email"], EMAIL);
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_http_error_statuses() {
    let (app, repo) = app(None);
    seed(repo.as_ref(), PASSWORD).await;

    let wrong = |email: &str| {
        json_request(
            "/login",
            serde_json::json!({"email": email, "password": WRONG_PASSWORD}),
        )
    };
    for email in [EMAIL, "ghost@example.com"] {
        for _ in 0..5 {
            assert_eq!(send(&app, wrong(email)).await.0, StatusCode::UNAUTHORIZED);
        }
        let (status, _, body) = send(&app, wrong(email)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS, "{email}");
        assert_eq!(body["status"], 429);
    }

    let (status, _, _) = send(
        &app,
        json_request("/login", serde_json::json!({"email": EMAIL, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _, _) = send(
        &app,
        json_request("/refresh", serde_json::json!({"refresh_token": "garbage"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, Request::get("/me").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        json_request(
            "/register",
            serde_json::json!({"name": "Ada", "email": EMAIL, "password": PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &app,
        Request::get("/google/login").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_http_google_flow() {
    let (app, repo) = app(Some(Arc::new(FakeOAuthProvider::verified(EMAIL))));

    let (status, headers, body) = send(
        &app,
        Request::get("/google/login").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let cookie = set_cookie(&headers);
    assert!(cookie.starts_with("oauth_state="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=300"));

    let state = cookie
        .trim_start_matches("oauth_state=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let auth_url = body["auth_url"].as_str().unwrap();
    assert!(auth_url.ends_with(&format!("state={state}")));

    let req = Request::get(format!("/google/callback?code=abc&state={state}"))
        .header(header::COOKIE, format!("oauth_state={state}"))
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert!(set_cookie(&headers).contains("Max-Age=0"));
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_http_google_callback_rejections() {
    let provider = Arc::new(FakeOAuthProvider::verified(EMAIL));
    let (app, repo) = app(Some(provider.clone()));

    let cases = [
        ("/google/callback?state=s1", Some("oauth_state=s1"), StatusCode::BAD_REQUEST),
        ("/google/callback?code=abc", Some("oauth_state=s1"), StatusCode::BAD_REQUEST),
        ("/google/callback?code=abc&state=s1", None, StatusCode::UNAUTHORIZED),
        ("/google/callback?code=abc&state=s1", Some("oauth_state=s2"), StatusCode::UNAUTHORIZED),
    ];

    for (uri, cookie, expected) in cases {
        let mut req = Request::get(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let (status, _, _) = send(&app, req.body(Body::empty()).unwrap()).await;
        assert_eq!(status, expected, "{uri} with {cookie:?}");
    }

    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
    assert!(repo.is_empty().await);
}
