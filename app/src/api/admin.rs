//! Admin back-office endpoints.
//!
//! - GET /api/admin/users?q= - Search users
//! - PATCH /api/admin/users/:id/role - Change a user's role

use crate::auth::middleware::SessionUser;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use marquee_auth::{UserId, UserProfile};
use marquee_web::{ApiJson, ApiPath, AppError};
use serde::{Deserialize, Serialize};

/// User search query.
#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    /// Case-insensitive substring of email or username
    pub q: Option<String>,
}

/// Users, newest first.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    /// Matching users
    pub users: Vec<UserProfile>,
}

/// Body of the role change.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// `Guest` or `Admin`
    pub role: String,
}

/// Result of a role change.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    /// Confirmation message
    pub message: &'static str,
    /// The updated user
    pub user: UserProfile,
}

/// Search users.
pub async fn list_users(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.roles.list_users(&principal, query.q.as_deref()).await?;
    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserProfile::from).collect(),
    }))
}

/// Set a user's role. Takes effect at that user's next login.
pub async fn set_user_role(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(request): ApiJson<RoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    let user = state.roles.set_user_role(&principal, user_id, &request.role).await?;
    Ok(Json(RoleResponse {
        message: "Role updated",
        user: UserProfile::from(user),
    }))
}
