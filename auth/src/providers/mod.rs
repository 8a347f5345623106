//! Account data model and storage interfaces.
//!
//! Services depend on the [`UserRepository`] trait; the runtime injects an
//! in-memory or PostgreSQL implementation from [`crate::stores`].

use crate::state::{Role, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod user;

pub use user::UserRepository;

/// Stored user account.
///
/// Carries the password hash, so it is never serialized to clients. Use
/// [`UserProfile`] for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User ID.
    pub user_id: UserId,

    /// Email address, lowercased.
    pub email: String,

    /// Optional display name.
    pub username: Option<String>,

    /// Argon2 PHC string.
    pub password_hash: String,

    /// Authorization role.
    pub role: Role,

    /// Public path of the uploaded avatar.
    pub profile_image: Option<String>,

    /// Account created timestamp.
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Client-facing view of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID
    pub id: UserId,
    /// Email address
    pub email: String,
    /// Display name
    pub username: Option<String>,
    /// Avatar path
    pub profile_image: Option<String>,
    /// Role
    pub role: Role,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            email: user.email.clone(),
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Case-insensitive substring match on email or username.
///
/// `needle` must already be lowercased. Shared by stores that filter in memory.
#[must_use]
pub fn matches_query(user: &User, needle: &str) -> bool {
    user.email.to_lowercase().contains(needle)
        || user
            .username
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_never_exposes_password_hash() {
        let now = Utc::now();
        let user = User {
            user_id: UserId::new(),
            email: "critic@example.com".to_string(),
            username: Some("Critic".to_string()),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Guest,
            profile_image: Some("/uploads/1-me.png".to_string()),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserProfile::from(&user)).unwrap_or_default();
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["profileImage"], "/uploads/1-me.png");
        assert_eq!(json["role"], "Guest");

        assert!(matches_query(&user, "critic"));
        assert!(matches_query(&user, "example.com"));
        assert!(!matches_query(&user, "director"));
    }
}
