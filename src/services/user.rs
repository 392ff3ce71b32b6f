//! User service
//!
//! Implements business logic for accounts and sessions:
//! - Signup with unique email/username enforcement
//! - Login/logout over server-side sessions
//! - Session token validation with lazy expiry cleanup
//! - External-identity login that creates-or-fetches a user by email

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists (duplicate email or username)
    #[error("{0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user signup
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_shelter: bool,
}

impl SignupInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        is_shelter: bool,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            is_shelter,
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

/// Input for external-identity login
#[derive(Debug, Clone)]
pub struct OauthInput {
    pub email: String,
    pub username: String,
    pub provider: String,
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Session lifetime in days, used by the cookie builder
    pub fn session_expiration_days(&self) -> i64 {
        self.session_expiration_days
    }

    /// Register a new account and open a session for it.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for empty or malformed fields
    /// - `UserExists` when the email or username is already registered
    pub async fn signup(&self, input: SignupInput) -> Result<(User, Session), UserServiceError> {
        self.validate_signup_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let role = if input.is_shelter {
            UserRole::Shelter
        } else {
            UserRole::Adopter
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(input.username, input.email, password_hash, role);
        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        let session = self.create_session(created.id).await?;

        Ok((created, session))
    }

    /// Login with credentials.
    ///
    /// # Errors
    ///
    /// `AuthenticationError` for an unknown account, a wrong password, or an
    /// external-identity account with no stored credential.
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid email or password".to_string())
            })?;

        let hash = user.password_hash.as_deref().ok_or_else(|| {
            UserServiceError::AuthenticationError(
                "This account uses an external identity provider".to_string(),
            )
        })?;

        let password_valid =
            verify_password(&input.password, hash).context("Failed to verify password")?;

        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;

        Ok((user, session))
    }

    /// External-identity login: fetch the account for this email or create
    /// one marked with the provider.
    pub async fn oauth_login(&self, input: OauthInput) -> Result<(User, Session), UserServiceError> {
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        let user = match self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
        {
            Some(user) => user,
            None => {
                let username = self.available_username(&input.username).await?;
                let user = User::external(username, input.email, input.provider);
                self.user_repo
                    .create(&user)
                    .await
                    .context("Failed to create user")?
            }
        };

        let session = self.create_session(user.id).await?;

        Ok((user, session))
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Validate session token and return the associated user.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// deleted on the way out.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Delete all expired sessions. Returns the number deleted.
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    fn validate_signup_input(&self, input: &SignupInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        // Basic email format validation
        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        let user = self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?;

        Ok(user)
    }

    /// Find a free username, appending a numeric suffix when taken
    async fn available_username(&self, wanted: &str) -> Result<String, UserServiceError> {
        let base = if wanted.trim().is_empty() {
            "user"
        } else {
            wanted.trim()
        };

        if self
            .user_repo
            .get_by_username(base)
            .await
            .context("Failed to check username")?
            .is_none()
        {
            return Ok(base.to_string());
        }

        for n in 1..100 {
            let candidate = format!("{}{}", base, n);
            if self
                .user_repo
                .get_by_username(&candidate)
                .await
                .context("Failed to check username")?
                .is_none()
            {
                return Ok(candidate);
            }
        }

        Err(UserServiceError::InternalError(anyhow::anyhow!(
            "Could not find a free username for '{}'",
            base
        )))
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);
        UserService::new(user_repo, session_repo)
    }

    async fn setup_with_expiration(days: i64) -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);
        UserService::with_session_expiration(user_repo, session_repo, days)
    }

    // ========================================================================
    // Signup tests
    // ========================================================================

    #[tokio::test]
    async fn test_signup_creates_adopter() {
        let service = setup_test_service().await;

        let input = SignupInput::new("alice", "alice@example.com", "password123", false);
        let (user, session) = service.signup(input).await.expect("Failed to sign up");

        assert_eq!(user.role, UserRole::Adopter);
        assert_eq!(user.email, "alice@example.com");
        assert!(!session.id.is_empty());
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_signup_creates_shelter() {
        let service = setup_test_service().await;

        let input = SignupInput::new("paws", "paws@example.com", "password123", true);
        let (user, _session) = service.signup(input).await.expect("Failed to sign up");

        assert_eq!(user.role, UserRole::Shelter);
        assert!(user.is_shelter());
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_fails_without_creating_account() {
        let service = setup_test_service().await;

        let input1 = SignupInput::new("user1", "same@example.com", "password123", false);
        service.signup(input1).await.expect("Failed to sign up");

        let input2 = SignupInput::new("user2", "same@example.com", "password456", false);
        let result = service.signup(input2).await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));

        // The second username must not exist
        let login = service
            .login(LoginInput::new("user2", "password456"))
            .await;
        assert!(matches!(
            login,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_signup_duplicate_username_fails() {
        let service = setup_test_service().await;

        let input1 = SignupInput::new("taken", "one@example.com", "password123", false);
        service.signup(input1).await.expect("Failed to sign up");

        let input2 = SignupInput::new("taken", "two@example.com", "password456", false);
        let result = service.signup(input2).await;

        assert!(matches!(result, Err(UserServiceError::UserExists(_))));
    }

    #[tokio::test]
    async fn test_signup_empty_fields_fail() {
        let service = setup_test_service().await;

        for input in [
            SignupInput::new("", "a@example.com", "password", false),
            SignupInput::new("user", "", "password", false),
            SignupInput::new("user", "a@example.com", "", false),
            SignupInput::new("user", "not-an-email", "password", false),
        ] {
            let result = service.signup(input).await;
            assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
        }
    }

    // ========================================================================
    // Login tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_with_email_success() {
        let service = setup_test_service().await;

        let input = SignupInput::new("alice", "alice@example.com", "password123", false);
        let (registered, _) = service.signup(input).await.expect("Failed to sign up");

        let (user, session) = service
            .login(LoginInput::new("alice@example.com", "password123"))
            .await
            .expect("Failed to login");

        assert_eq!(user.id, registered.id);
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_login_with_username_success() {
        let service = setup_test_service().await;

        let input = SignupInput::new("alice", "alice@example.com", "password123", false);
        service.signup(input).await.expect("Failed to sign up");

        let result = service
            .login(LoginInput::new("alice", "password123"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let service = setup_test_service().await;

        let input = SignupInput::new("alice", "alice@example.com", "password123", false);
        service.signup(input).await.expect("Failed to sign up");

        let result = service
            .login(LoginInput::new("alice@example.com", "wrongpassword"))
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_nonexistent_user_fails() {
        let service = setup_test_service().await;

        let result = service
            .login(LoginInput::new("ghost@example.com", "password123"))
            .await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_external_account_fails() {
        let service = setup_test_service().await;

        let (user, _) = service
            .oauth_login(OauthInput {
                email: "ext@example.com".to_string(),
                username: "ext".to_string(),
                provider: "google".to_string(),
            })
            .await
            .expect("Failed to oauth login");
        assert!(user.password_hash.is_none());

        let result = service
            .login(LoginInput::new("ext@example.com", "whatever"))
            .await;
        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    // ========================================================================
    // External-identity login tests
    // ========================================================================

    #[tokio::test]
    async fn test_oauth_login_creates_then_fetches() {
        let service = setup_test_service().await;

        let input = OauthInput {
            email: "ext@example.com".to_string(),
            username: "ext".to_string(),
            provider: "google".to_string(),
        };

        let (first, _) = service.oauth_login(input.clone()).await.expect("first login");
        let (second, _) = service.oauth_login(input).await.expect("second login");

        assert_eq!(first.id, second.id, "Same email must map to one account");
        assert_eq!(first.provider.as_deref(), Some("google"));
    }

    #[tokio::test]
    async fn test_oauth_login_picks_free_username() {
        let service = setup_test_service().await;

        // Take the username via normal signup
        service
            .signup(SignupInput::new("ext", "taken@example.com", "pw", false))
            .await
            .unwrap();

        let (user, _) = service
            .oauth_login(OauthInput {
                email: "ext@example.com".to_string(),
                username: "ext".to_string(),
                provider: "google".to_string(),
            })
            .await
            .expect("oauth login");

        assert_ne!(user.username, "ext");
        assert!(user.username.starts_with("ext"));
    }

    // ========================================================================
    // Session tests
    // ========================================================================

    #[tokio::test]
    async fn test_validate_session_success() {
        let service = setup_test_service().await;

        let (registered, session) = service
            .signup(SignupInput::new("alice", "alice@example.com", "pw123", false))
            .await
            .expect("Failed to sign up");

        let user = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session")
            .expect("User not found");

        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_validate_session_nonexistent_returns_none() {
        let service = setup_test_service().await;

        let result = service
            .validate_session("nonexistent-session-id")
            .await
            .expect("Failed to validate session");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_session_returns_none() {
        let service = setup_with_expiration(-1).await;

        let (_, session) = service
            .signup(SignupInput::new("alice", "alice@example.com", "pw123", false))
            .await
            .expect("Failed to sign up");

        assert!(session.is_expired());

        let result = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup_test_service().await;

        let (_, session) = service
            .signup(SignupInput::new("alice", "alice@example.com", "pw123", false))
            .await
            .expect("Failed to sign up");

        service.logout(&session.id).await.expect("Failed to logout");

        let result = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_logout_nonexistent_session_succeeds() {
        let service = setup_test_service().await;

        let result = service.logout("nonexistent-session-id").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let service = setup_with_expiration(-1).await;

        service
            .signup(SignupInput::new("alice", "alice@example.com", "pw123", false))
            .await
            .expect("Failed to sign up");

        let count = service
            .cleanup_expired_sessions()
            .await
            .expect("Failed to cleanup");

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let service = setup_test_service().await;

        let password = "my_secret_password";
        let (user, _) = service
            .signup(SignupInput::new("alice", "alice@example.com", password, false))
            .await
            .expect("Failed to sign up");

        let hash = user.password_hash.expect("Hash must be stored");
        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    async fn setup_property_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool);
        UserService::new(user_repo, session_repo)
    }

    fn unique_suffix() -> u64 {
        TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// For any valid credentials, signup then login yields a token that
        /// validates to the same user.
        #[test]
        fn auth_roundtrip(
            username in "[a-z]{3,10}",
            email_prefix in "[a-z]{3,10}",
            password in "[a-zA-Z0-9!@#$%^&*]{8,20}"
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;
                let suffix = unique_suffix();

                let unique_username = format!("{}_{}", username, suffix);
                let unique_email = format!("{}_{}@example.com", email_prefix, suffix);

                let (registered, _) = service
                    .signup(SignupInput::new(
                        unique_username.clone(),
                        unique_email.clone(),
                        password.clone(),
                        false,
                    ))
                    .await
                    .expect("Signup should succeed");

                let (_, session) = service
                    .login(LoginInput::new(unique_email, password))
                    .await
                    .expect("Login should succeed with valid credentials");

                let validated = service
                    .validate_session(&session.id)
                    .await
                    .expect("Session validation should not error")
                    .expect("Session should be valid");

                prop_assert_eq!(validated.id, registered.id);
                prop_assert_eq!(validated.username, registered.username);
                Ok(())
            });
            result?;
        }

        /// For any wrong password, login returns an authentication error and
        /// no session is created.
        #[test]
        fn invalid_credentials_rejected(
            username in "[a-z]{3,10}",
            correct_password in "[a-zA-Z0-9]{8,20}",
            wrong_password in "[a-zA-Z0-9]{8,20}",
        ) {
            prop_assume!(correct_password != wrong_password);

            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_property_test_service().await;
                let suffix = unique_suffix();

                let unique_username = format!("{}_{}", username, suffix);
                let unique_email = format!("{}_{}@example.com", username, suffix);

                service
                    .signup(SignupInput::new(
                        unique_username.clone(),
                        unique_email,
                        correct_password,
                        false,
                    ))
                    .await
                    .expect("Signup should succeed");

                let result = service
                    .login(LoginInput::new(unique_username, wrong_password))
                    .await;
                prop_assert!(matches!(
                    result,
                    Err(UserServiceError::AuthenticationError(_))
                ));
                Ok(())
            });
            result?;
        }
    }
}
