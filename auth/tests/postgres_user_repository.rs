//! `PostgresUserRepository` against a real database.
//!
//! Docker must be running. Run with
//! `cargo test -p marquee-auth --features postgres -- --ignored`.

#![cfg(feature = "postgres")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{Duration, Utc};
use marquee_auth::stores::PostgresUserRepository;
use marquee_auth::{AuthError, Role, User, UserId, UserRepository};
use marquee_postgres::test_support::start_postgres;

fn account(email: &str, username: Option<&str>, minutes_ago: i64) -> User {
    let at = Utc::now() - Duration::minutes(minutes_ago);
    User {
        user_id: UserId::new(),
        email: email.to_string(),
        username: username.map(str::to_string),
        password_hash: "$argon2id$v=19$placeholder".to_string(),
        role: Role::Guest,
        profile_image: None,
        created_at: at,
        updated_at: at,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn create_and_find_user() {
    let db = start_postgres().await.expect("database");
    let repo = PostgresUserRepository::new(db.pool.clone());

    let created = repo
        .create_user(&account("reel@example.com", Some("Reel"), 0))
        .await
        .expect("create");

    let by_email = repo
        .find_user_by_email("reel@example.com")
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(by_email.user_id, created.user_id);

    let by_id = repo.get_user_by_id(created.user_id).await.expect("by id");
    assert_eq!(by_id.username.as_deref(), Some("Reel"));

    assert!(repo.find_user_by_email("nobody@example.com").await.expect("lookup").is_none());
    assert_eq!(
        repo.get_user_by_id(UserId::new()).await.unwrap_err(),
        AuthError::UserNotFound
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_email_maps_to_email_taken() {
    let db = start_postgres().await.expect("database");
    let repo = PostgresUserRepository::new(db.pool.clone());

    repo.create_user(&account("twice@example.com", None, 0)).await.expect("first");
    let second = repo.create_user(&account("twice@example.com", None, 0)).await;
    assert_eq!(second.unwrap_err(), AuthError::EmailTaken);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn role_and_avatar_updates_persist() {
    let db = start_postgres().await.expect("database");
    let repo = PostgresUserRepository::new(db.pool.clone());
    let user = repo.create_user(&account("crew@example.com", None, 0)).await.expect("create");

    let promoted = repo.update_role(user.user_id, Role::Admin, Utc::now()).await.expect("role");
    assert_eq!(promoted.role, Role::Admin);

    let with_avatar = repo
        .update_profile_image(user.user_id, "/uploads/1-crew.png", Utc::now())
        .await
        .expect("avatar");
    assert_eq!(with_avatar.profile_image.as_deref(), Some("/uploads/1-crew.png"));
    assert_eq!(with_avatar.role, Role::Admin);

    assert_eq!(
        repo.update_role(UserId::new(), Role::Admin, Utc::now()).await.unwrap_err(),
        AuthError::UserNotFound
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn search_is_case_insensitive_and_newest_first() {
    let db = start_postgres().await.expect("database");
    let repo = PostgresUserRepository::new(db.pool.clone());

    repo.create_user(&account("old@example.com", Some("Projectionist"), 30)).await.expect("old");
    repo.create_user(&account("new@example.com", None, 1)).await.expect("new");
    repo.create_user(&account("100%@cinema.org", None, 5)).await.expect("literal");

    let all = repo.search_users(None).await.expect("all");
    assert_eq!(all.first().map(|u| u.email.as_str()), Some("new@example.com"));
    assert_eq!(all.len(), 3);

    let by_name = repo.search_users(Some("PROJECTION")).await.expect("by name");
    assert_eq!(by_name.len(), 1);

    let literal = repo.search_users(Some("100%")).await.expect("literal");
    assert_eq!(literal.len(), 1);
}
