//! PostgreSQL user repository implementation.
//!
//! # Example
//!
//! ```no_run
//! use marquee_auth::stores::postgres::PostgresUserRepository;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/marquee").await?;
//! let repo = PostgresUserRepository::new(pool);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::providers::{User, UserRepository};
use crate::state::{Role, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_postgres::is_unique_violation;
use sqlx::PgPool;

const USER_COLUMNS: &str =
    "id, email, username, password_hash, role, profile_image, created_at, updated_at";

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    email: String,
    username: Option<String>,
    password_hash: String,
    role: String,
    profile_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| AuthError::DatabaseError(format!("Unknown role in storage: {}", row.role)))?;

        Ok(Self {
            user_id: UserId(row.id),
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            role,
            profile_image: row.profile_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> AuthError + '_ {
    move |e| AuthError::DatabaseError(format!("{context}: {e}"))
}

/// Escape `LIKE` wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get user"))?
        .ok_or(AuthError::UserNotFound)?;

        row.try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get user by email"))?
        .map(User::try_from)
        .transpose()
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (id, email, username, password_hash, role, profile_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.user_id.0)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.profile_image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::DatabaseError(format!("Failed to create user: {e}"))
            }
        })?;

        row.try_into()
    }

    async fn update_role(&self, user_id: UserId, role: Role, at: DateTime<Utc>) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id.0)
        .bind(role.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update role"))?
        .ok_or(AuthError::UserNotFound)?;

        row.try_into()
    }

    async fn update_profile_image(
        &self,
        user_id: UserId,
        path: &str,
        at: DateTime<Utc>,
    ) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET profile_image = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id.0)
        .bind(path)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update profile image"))?
        .ok_or(AuthError::UserNotFound)?;

        row.try_into()
    }

    async fn search_users(&self, query: Option<&str>) -> Result<Vec<User>> {
        let rows = match query {
            Some(q) => {
                sqlx::query_as::<_, UserRow>(&format!(
                    r"
                    SELECT {USER_COLUMNS} FROM users
                    WHERE email ILIKE $1 OR username ILIKE $1
                    ORDER BY created_at DESC
                    "
                ))
                .bind(like_pattern(q))
                .fetch_all(&self.pool)
                .await
            },
            None => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            },
        }
        .map_err(db_error("Failed to list users"))?;

        rows.into_iter().map(User::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("ada"), "%ada%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
