//! Registration, login, and session verification.

use crate::config::SessionConfig;
use crate::error::{AuthError, Result};
use crate::password::{spawn_hash, spawn_verify, spawn_verify_unknown};
use crate::providers::{User, UserRepository};
use crate::state::{Principal, Role, UserId};
use crate::token::{SessionToken, SessionTokens};
use crate::utils::{normalize_email, validate_email};
use marquee_core::environment::Clock;
use std::sync::Arc;

/// Account and session operations.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: SessionTokens,
    clock: Arc<dyn Clock>,
    admin_email: Option<String>,
}

impl AuthService {
    /// Create the service from a repository and session settings.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens: SessionTokens::new(config.jwt_secret.as_bytes(), config.session_ttl),
            clock,
            admin_email: config
                .admin_email
                .as_deref()
                .map(normalize_email)
                .filter(|email| !email.is_empty()),
        }
    }

    /// Register a new account.
    ///
    /// The account is `Admin` if its email matches the configured bootstrap
    /// address, otherwise `Guest`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] for a blank or malformed email, or a blank password
    /// - [`AuthError::EmailTaken`] if the email is already registered
    #[tracing::instrument(skip(self, password, username))]
    pub async fn register(&self, email: &str, password: &str, username: Option<&str>) -> Result<User> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
        validate_email(&email)?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let role = if self.admin_email.as_deref() == Some(email.as_str()) {
            Role::Admin
        } else {
            Role::Guest
        };

        let password_hash = spawn_hash(password).await?;
        let now = self.clock.now();
        let user = User {
            user_id: UserId::new(),
            email,
            username: username
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            password_hash,
            role,
            profile_image: None,
            created_at: now,
            updated_at: now,
        };

        let user = self.users.create_user(&user).await?;
        tracing::info!(user_id = %user.user_id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] if either field is blank
    /// - [`AuthError::InvalidCredentials`] for an unknown email or wrong password
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, SessionToken)> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.find_user_by_email(&email).await? else {
            tracing::debug!("Login for unknown email");
            spawn_verify_unknown(password).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !spawn_verify(password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.user_id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user, self.clock.now())?;
        tracing::info!(user_id = %user.user_id, "User logged in");
        Ok((user, token))
    }

    /// Verify a session token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] or [`AuthError::SessionExpired`].
    pub fn verify(&self, token: &str) -> Result<Principal> {
        self.tokens.verify(token)
    }

    /// Reload the stored account behind a principal.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] if the account no longer exists.
    pub async fn current_user(&self, principal: &Principal) -> Result<User> {
        match self.users.get_user_by_id(principal.id).await {
            Err(AuthError::UserNotFound) => Err(AuthError::Unauthenticated),
            other => other,
        }
    }

    /// Point the principal's avatar at an uploaded file.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] if the account no longer exists.
    #[tracing::instrument(skip(self), fields(user_id = %principal.id))]
    pub async fn set_profile_image(&self, principal: &Principal, path: &str) -> Result<User> {
        self.users
            .update_profile_image(principal.id, path, self.clock.now())
            .await
    }

    /// Session lifetime, for cookie `Max-Age`.
    #[must_use]
    pub const fn session_ttl(&self) -> std::time::Duration {
        self.tokens.ttl()
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("tokens", &self.tokens)
            .field("admin_email", &self.admin_email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stores::InMemoryUserRepository;
    use marquee_testing::test_clock;

    fn service() -> AuthService {
        let config = SessionConfig::new("unit-test-secret")
            .with_admin_email(Some("Boss@Cinema.test".to_string()));
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            &config,
            Arc::new(test_clock()),
        )
    }

    #[tokio::test]
    async fn register_normalizes_email_and_defaults_to_guest() {
        let auth = service();
        let user = auth
            .register("  Viewer@Example.com ", "pw", Some("  Vee "))
            .await
            .unwrap();

        assert_eq!(user.email, "viewer@example.com");
        assert_eq!(user.username.as_deref(), Some("Vee"));
        assert_eq!(user.role, Role::Guest);
        assert_ne!(user.password_hash, "pw");
    }

    #[tokio::test]
    async fn bootstrap_email_becomes_admin() {
        let auth = service();
        let user = auth.register("boss@cinema.test", "pw", None).await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_case_insensitively() {
        let auth = service();
        auth.register("dup@example.com", "pw", None).await.unwrap();
        let second = auth.register("DUP@example.com", "other", None).await;
        assert_eq!(second.unwrap_err(), AuthError::EmailTaken);
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let auth = service();
        assert!(matches!(
            auth.register("", "pw", None).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("a@example.com", "", None).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("not-an-email", "pw", None).await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let auth = service();
        auth.register("known@example.com", "right", None).await.unwrap();

        let unknown = auth.login("nobody@example.com", "right").await.unwrap_err();
        let wrong = auth.login("known@example.com", "wrong").await.unwrap_err();
        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(unknown.to_string(), wrong.to_string());

        assert!(matches!(
            auth.login("known@example.com", "").await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn unknown_email_costs_a_password_check() {
        let auth = service();
        auth.register("known@example.com", "right", None).await.unwrap();
        // Warm the placeholder hash
        let _ = auth.login("first@example.com", "right").await;

        let started = std::time::Instant::now();
        let _ = auth.login("known@example.com", "wrong").await;
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        let unknown = auth.login("nobody@example.com", "right").await;
        let unknown_email = started.elapsed();

        assert_eq!(unknown.unwrap_err(), AuthError::InvalidCredentials);
        assert!(
            unknown_email * 4 >= wrong_password,
            "unknown email answered in {unknown_email:?}, wrong password in {wrong_password:?}"
        );
    }

    #[tokio::test]
    async fn login_token_verifies_to_stored_identity() {
        let auth = service();
        let registered = auth.register("fan@example.com", "secret", None).await.unwrap();

        // The fixed test clock sits in 2025, so issue against real time here.
        let tokens = SessionTokens::new(b"unit-test-secret", auth.session_ttl());
        let token = tokens.issue(&registered, chrono::Utc::now()).unwrap();

        let principal = auth.verify(&token.token).unwrap();
        assert_eq!(principal.id, registered.user_id);
        assert_eq!(principal.email, registered.email);
        assert_eq!(principal.role, registered.role);

        let (user, _) = auth.login("FAN@example.com", "secret").await.unwrap();
        assert_eq!(user.user_id, registered.user_id);
    }

    #[tokio::test]
    async fn current_user_of_deleted_account_is_unauthenticated() {
        let auth = service();
        let ghost = Principal {
            id: UserId::new(),
            email: "ghost@example.com".to_string(),
            role: Role::Guest,
        };
        assert_eq!(
            auth.current_user(&ghost).await.unwrap_err(),
            AuthError::Unauthenticated
        );
    }
}
