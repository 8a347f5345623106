//! Admin-only account management: user search and role changes.

use crate::error::Result;
use crate::providers::{User, UserRepository};
use crate::state::{Principal, Role, UserId};
use marquee_core::environment::Clock;
use std::sync::Arc;

/// Role administration, gated to `Admin` principals.
#[derive(Clone)]
pub struct RoleService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl RoleService {
    /// Create the service.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// List users newest first, optionally filtered by a case-insensitive
    /// substring of email or username. A blank query means no filter.
    ///
    /// # Errors
    ///
    /// `InsufficientPermissions` unless `requester` is an admin.
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn list_users(&self, requester: &Principal, query: Option<&str>) -> Result<Vec<User>> {
        requester.require_admin()?;
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        self.users.search_users(query).await
    }

    /// Set a user's role. Setting the current role again is a no-op success.
    ///
    /// # Errors
    ///
    /// - `InsufficientPermissions` unless `requester` is an admin
    /// - `InvalidRole` for anything but `Guest` or `Admin`
    /// - `UserNotFound` for an unknown user
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn set_user_role(&self, requester: &Principal, user_id: UserId, role: &str) -> Result<User> {
        requester.require_admin()?;
        let role = role.parse::<Role>()?;

        let user = self.users.update_role(user_id, role, self.clock.now()).await?;
        tracing::info!(user_id = %user_id, role = %role, "User role updated");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::stores::InMemoryUserRepository;
    use marquee_testing::test_clock;

    async fn seeded() -> (RoleService, User) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let now = chrono::Utc::now();
        let user = repo
            .create_user(&User {
                user_id: UserId::new(),
                email: "guest@example.com".to_string(),
                username: Some("popcorn".to_string()),
                password_hash: "hash".to_string(),
                role: Role::Guest,
                profile_image: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (RoleService::new(repo, Arc::new(test_clock())), user)
    }

    fn principal(role: Role) -> Principal {
        Principal {
            id: UserId::new(),
            email: "caller@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn set_role_twice_is_idempotent() {
        let (roles, user) = seeded().await;
        let admin = principal(Role::Admin);

        let first = roles.set_user_role(&admin, user.user_id, "Admin").await.unwrap();
        let second = roles.set_user_role(&admin, user.user_id, "Admin").await.unwrap();
        assert_eq!(first.role, Role::Admin);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn role_changes_are_admin_only_and_validated() {
        let (roles, user) = seeded().await;

        let denied = roles
            .set_user_role(&principal(Role::Guest), user.user_id, "Admin")
            .await;
        assert!(matches!(denied, Err(AuthError::InsufficientPermissions { .. })));

        let admin = principal(Role::Admin);
        let bad = roles.set_user_role(&admin, user.user_id, "Superuser").await;
        assert!(matches!(bad, Err(AuthError::InvalidRole(_))));

        let missing = roles.set_user_role(&admin, UserId::new(), "Guest").await;
        assert_eq!(missing.unwrap_err(), AuthError::UserNotFound);
    }

    #[tokio::test]
    async fn listing_is_admin_only_and_ignores_blank_queries() {
        let (roles, _) = seeded().await;
        assert!(roles.list_users(&principal(Role::Guest), None).await.is_err());

        let admin = principal(Role::Admin);
        assert_eq!(roles.list_users(&admin, Some("   ")).await.unwrap().len(), 1);
        assert_eq!(roles.list_users(&admin, Some("POP")).await.unwrap().len(), 1);
        assert!(roles.list_users(&admin, Some("nomatch")).await.unwrap().is_empty());
    }
}
