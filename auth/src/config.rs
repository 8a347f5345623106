//! Session and account configuration.

use std::time::Duration;

/// Default session lifetime: seven days.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "sid";

/// Settings for token signing, cookie delivery, and admin bootstrap.
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC secret for HS256 session tokens
    pub jwt_secret: String,
    /// Token and cookie lifetime
    pub session_ttl: Duration,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Send `Secure; SameSite=None` cookies (production)
    pub secure_cookies: bool,
    /// Email that is granted `Admin` at registration
    pub admin_email: Option<String>,
}

impl SessionConfig {
    /// Configuration with defaults for everything but the secret.
    #[must_use]
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_ttl: DEFAULT_SESSION_TTL,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure_cookies: false,
            admin_email: None,
        }
    }

    /// Set the session lifetime
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the bootstrap admin email
    #[must_use]
    pub fn with_admin_email(mut self, email: Option<String>) -> Self {
        self.admin_email = email;
        self
    }

    /// Toggle production cookie attributes
    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Set the cookie name
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookies", &self.secure_cookies)
            .field("admin_email", &self.admin_email)
            .finish()
    }
}
