//! Session cookie policy.
//!
//! Builds the `sid` cookie with [`tower_cookies`] so the HTTP layer only
//! has to add it to the request's cookie jar.

use crate::config::SessionConfig;
use tower_cookies::cookie::{SameSite, time::Duration};
use tower_cookies::{Cookie, Cookies};

/// Builds and reads the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age: Duration,
}

impl SessionCookie {
    /// Cookie policy derived from the session configuration
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        let max_age = i64::try_from(config.session_ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookies,
            max_age: Duration::seconds(max_age),
        }
    }

    /// Cookie name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cookie carrying `token`.
    #[must_use]
    pub fn session(&self, token: impl Into<String>) -> Cookie<'static> {
        self.build(token.into(), self.max_age)
    }

    /// Same cookie, emptied and expired.
    #[must_use]
    pub fn removal(&self) -> Cookie<'static> {
        self.build(String::new(), Duration::ZERO)
    }

    /// The session token from the request's cookie jar, quotes removed.
    #[must_use]
    pub fn token(&self, cookies: &Cookies) -> Option<String> {
        cookies
            .get(&self.name)
            .map(|cookie| cookie.value_trimmed().to_string())
            .filter(|value| !value.is_empty())
    }

    fn build(&self, value: String, max_age: Duration) -> Cookie<'static> {
        // Browsers drop SameSite=None cookies that are not also Secure.
        let same_site = if self.secure { SameSite::None } else { SameSite::Lax };
        Cookie::build((self.name.clone(), value))
            .http_only(true)
            .path("/")
            .max_age(max_age)
            .same_site(same_site)
            .secure(self.secure)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(secure: bool) -> SessionCookie {
        SessionCookie::from_config(&SessionConfig::new("s").with_secure_cookies(secure))
    }

    #[test]
    fn production_cookie_is_cross_site() {
        let cookie = cookie(true).session("tok");
        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(604_800)));
    }

    #[test]
    fn development_cookie_is_lax() {
        let header = cookie(false).session("tok").to_string();
        assert!(header.starts_with("sid=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn removal_expires_immediately() {
        let removal = cookie(false).removal();
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(Duration::ZERO));
        assert_eq!(removal.path(), Some("/"));
    }

    #[test]
    fn cookie_name_follows_config() {
        let custom = SessionCookie::from_config(&SessionConfig::new("s").with_cookie_name("marquee_sid"));
        assert_eq!(custom.name(), "marquee_sid");
        assert_eq!(custom.session("t").name(), "marquee_sid");
    }
}
