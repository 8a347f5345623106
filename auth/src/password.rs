//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with
//! the hash and verification needs nothing else.
//!
//! Argon2 is CPU-bound by construction. Async callers go through the
//! `spawn_*` functions, which run it on tokio's blocking pool.

use crate::error::{AuthError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

/// Verified against when the account does not exist, so an unknown email
/// costs as much as a wrong password.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("marquee-unknown-account").ok());

async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::InternalError(format!("Password task failed: {e}")))?
}

/// [`hash_password`] on the blocking pool.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if hashing fails or the task panics.
pub async fn spawn_hash(password: &str) -> Result<String> {
    let password = password.to_string();
    blocking(move || hash_password(&password)).await
}

/// [`verify_password`] on the blocking pool.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if the stored hash is unreadable or
/// the task panics.
pub async fn spawn_verify(password: &str, stored_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    blocking(move || verify_password(&password, &stored_hash)).await
}

/// Spend one verification on a login for an email with no account.
pub async fn spawn_verify_unknown(password: &str) {
    let password = password.to_string();
    let outcome = blocking(move || match UNKNOWN_ACCOUNT_HASH.as_deref() {
        Some(hash) => verify_password(&password, hash).map(|_| ()),
        None => Err(AuthError::InternalError("no placeholder hash".to_string())),
    })
    .await;
    if let Err(e) = outcome {
        tracing::warn!(error = %e, "Placeholder password check failed");
    }
}

/// Hash a plain-text password with a fresh random salt.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AuthError::InternalError("password hashing failed".to_string())
        })
}

/// Check a plain-text password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; errors are reserved for unreadable hashes.
///
/// # Errors
///
/// Returns [`AuthError::InternalError`] if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::error!(error = %e, "Stored password hash is unreadable");
        AuthError::InternalError("stored password hash is invalid".to_string())
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            tracing::error!(error = %e, "Password verification failed");
            Err(AuthError::InternalError("password verification failed".to_string()))
        },
    }
}
