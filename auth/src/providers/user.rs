//! User repository trait.

use super::User;
use crate::error::Result;
use crate::state::{Role, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// User repository.
///
/// Abstracts account persistence. Emails are stored and looked up in their
/// normalized (lowercased) form; callers normalize before calling.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// - User not found → `AuthError::UserNotFound`
    /// - Storage failure → `AuthError::DatabaseError`
    async fn get_user_by_id(&self, user_id: UserId) -> Result<User>;

    /// Get user by normalized email, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the lookup fails.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create user.
    ///
    /// # Errors
    ///
    /// - Email already registered → `AuthError::EmailTaken`
    /// - Storage failure → `AuthError::DatabaseError`
    async fn create_user(&self, user: &User) -> Result<User>;

    /// Set a user's role and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// - User not found → `AuthError::UserNotFound`
    /// - Storage failure → `AuthError::DatabaseError`
    async fn update_role(&self, user_id: UserId, role: Role, at: DateTime<Utc>) -> Result<User>;

    /// Set a user's avatar path and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// - User not found → `AuthError::UserNotFound`
    /// - Storage failure → `AuthError::DatabaseError`
    async fn update_profile_image(
        &self,
        user_id: UserId,
        path: &str,
        at: DateTime<Utc>,
    ) -> Result<User>;

    /// List users, newest first, optionally filtered by a case-insensitive
    /// substring of email or username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DatabaseError` if the query fails.
    async fn search_users(&self, query: Option<&str>) -> Result<Vec<User>>;
}
