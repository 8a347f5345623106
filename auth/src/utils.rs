//! Utility functions for authentication.

use crate::error::{AuthError, Result};

/// Validate email address format.
///
/// Basic structural check:
/// - Must contain exactly one `@`
/// - Must have non-empty local and domain parts, and a dot in the domain
/// - Length must be between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use marquee_auth::utils::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// assert!(validate_email("@example.com").is_err());
/// ```
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] describing the first failed check.
pub fn validate_email(email: &str) -> Result<()> {
    if email.len() < 3 || email.len() > 255 {
        return Err(AuthError::InvalidInput(
            "Email must be between 3 and 255 characters".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidInput("Email must contain @".to_string()));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(AuthError::InvalidInput("Email is malformed".to_string()));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AuthError::InvalidInput("Email domain is malformed".to_string()));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidInput(
            "Email must not contain whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Canonical form used for storage and lookups: trimmed and lowercased.
///
/// ```
/// use marquee_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
