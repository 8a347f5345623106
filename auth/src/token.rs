//! HS256 JWT session tokens.
//!
//! Tokens are stateless: the server keeps no session table, so logout only
//! clears the cookie and a role change is visible after the next login.

use crate::error::{AuthError, Result};
use crate::providers::User;
use crate::state::{Principal, Role, UserId};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly issued token and when it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Encoded JWT
    pub token: String,
    /// Expiry instant (matches the `exp` claim)
    pub expires_at: DateTime<Utc>,
}

/// Token issuer and verifier.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokens {
    /// Create an issuer/verifier pair from a shared secret.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Token lifetime
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user`, valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if the lifetime overflows or signing fails.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<SessionToken> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|_| AuthError::InternalError("session ttl out of range".to_string()))?;
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user.user_id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            AuthError::InternalError("token signing failed".to_string())
        })?;

        Ok(SessionToken { token, expires_at })
    }

    /// Verify signature and expiry, returning the caller's principal.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionExpired`] if `exp` has passed
    /// - [`AuthError::InvalidToken`] for anything else wrong with the token
    pub fn verify(&self, token: &str) -> Result<Principal> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::SessionExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let claims = data.claims;
        let id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(Principal {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SESSION_TTL;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            user_id: UserId::new(),
            email: "viewer@example.com".to_string(),
            username: None,
            password_hash: String::new(),
            role,
            profile_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_verifies_to_matching_principal() {
        let tokens = SessionTokens::new(b"test-secret", DEFAULT_SESSION_TTL);
        let user = user(Role::Admin);
        let now = Utc::now();

        let issued = tokens.issue(&user, now).unwrap();
        assert_eq!((issued.expires_at - now).num_days(), 7);

        let principal = tokens.verify(&issued.token).unwrap();
        assert_eq!(principal.id, user.user_id);
        assert_eq!(principal.email, user.email);
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = SessionTokens::new(b"test-secret", DEFAULT_SESSION_TTL);
        let issued_long_ago = Utc::now() - chrono::Duration::days(8);

        let issued = tokens.issue(&user(Role::Guest), issued_long_ago).unwrap();
        assert_eq!(tokens.verify(&issued.token), Err(AuthError::SessionExpired));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = SessionTokens::new(b"test-secret", DEFAULT_SESSION_TTL);
        let issued = tokens.issue(&user(Role::Guest), Utc::now()).unwrap();

        let (body, signature) = issued.token.rsplit_once('.').unwrap();
        let replacement = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{body}.{replacement}{}", &signature[1..]);
        assert_eq!(tokens.verify(&tampered), Err(AuthError::InvalidToken));

        let other = SessionTokens::new(b"another-secret", DEFAULT_SESSION_TTL);
        assert_eq!(other.verify(&issued.token), Err(AuthError::InvalidToken));
        assert_eq!(tokens.verify("garbage"), Err(AuthError::InvalidToken));
    }
}
