//! In-memory user repository.
//!
//! Backs the `memory` storage mode and every test that does not need a
//! database.

use crate::error::{AuthError, Result};
use crate::providers::{User, UserRepository, matches_query};
use crate::state::{Role, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory user repository.
///
/// A single mutex guards both indexes, so the email uniqueness check and the
/// insert happen as one step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    inner: Arc<Mutex<Accounts>>,
}

#[derive(Debug, Default)]
struct Accounts {
    users: HashMap<UserId, User>,
    ids_by_email: HashMap<String, UserId>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Accounts>> {
        self.inner
            .lock()
            .map_err(|_| AuthError::InternalError("user store lock poisoned".to_string()))
    }

    fn modify(&self, user_id: UserId, change: impl FnOnce(&mut User)) -> Result<User> {
        let mut accounts = self.lock()?;
        let user = accounts
            .users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?;
        change(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        self.lock()?
            .users
            .get(&user_id)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let accounts = self.lock()?;
        Ok(accounts
            .ids_by_email
            .get(email)
            .and_then(|id| accounts.users.get(id))
            .cloned())
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        let mut accounts = self.lock()?;
        if accounts.ids_by_email.contains_key(&user.email) {
            return Err(AuthError::EmailTaken);
        }
        accounts.ids_by_email.insert(user.email.clone(), user.user_id);
        accounts.users.insert(user.user_id, user.clone());
        Ok(user.clone())
    }

    async fn update_role(&self, user_id: UserId, role: Role, at: DateTime<Utc>) -> Result<User> {
        self.modify(user_id, |user| {
            user.role = role;
            user.updated_at = at;
        })
    }

    async fn update_profile_image(
        &self,
        user_id: UserId,
        path: &str,
        at: DateTime<Utc>,
    ) -> Result<User> {
        self.modify(user_id, |user| {
            user.profile_image = Some(path.to_string());
            user.updated_at = at;
        })
    }

    async fn search_users(&self, query: Option<&str>) -> Result<Vec<User>> {
        let needle = query.map(str::to_lowercase);
        let mut users: Vec<User> = self
            .lock()?
            .users
            .values()
            .filter(|user| needle.as_deref().is_none_or(|n| matches_query(user, n)))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(email: &str, username: Option<&str>, minutes_ago: i64) -> User {
        let at = Utc::now() - chrono::Duration::minutes(minutes_ago);
        User {
            user_id: UserId::new(),
            email: email.to_string(),
            username: username.map(str::to_string),
            password_hash: "hash".to_string(),
            role: Role::Guest,
            profile_image: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(&account("a@example.com", None, 0)).await.unwrap();

        let result = repo.create_user(&account("a@example.com", None, 0)).await;
        assert_eq!(result, Err(AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn search_filters_and_sorts_newest_first() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(&account("old@example.com", Some("Projectionist"), 30)).await.unwrap();
        repo.create_user(&account("new@example.com", None, 1)).await.unwrap();
        repo.create_user(&account("usher@cinema.org", None, 10)).await.unwrap();

        let all = repo.search_users(None).await.unwrap();
        let emails: Vec<_> = all.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["new@example.com", "usher@cinema.org", "old@example.com"]);

        let filtered = repo.search_users(Some("PROJECTION")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].email, "old@example.com");

        let by_domain = repo.search_users(Some("example")).await.unwrap();
        assert_eq!(by_domain.len(), 2);
    }

    #[tokio::test]
    async fn updates_require_existing_user() {
        let repo = InMemoryUserRepository::new();
        let missing = repo.update_role(UserId::new(), Role::Admin, Utc::now()).await;
        assert_eq!(missing, Err(AuthError::UserNotFound));

        let user = repo.create_user(&account("x@example.com", None, 0)).await.unwrap();
        let updated = repo
            .update_profile_image(user.user_id, "/uploads/1-x.png", Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.profile_image.as_deref(), Some("/uploads/1-x.png"));
    }
}
