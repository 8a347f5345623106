//! Account endpoints: register, login, logout, current user, avatar.
//!
//! Mounted under `/api/auth` and, for older clients, `/api/users`.

use crate::api::uploads::read_image_field;
use crate::auth::middleware::SessionUser;
use crate::error::UploadError;
use crate::metrics;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use marquee_auth::UserProfile;
use marquee_web::{ApiJson, AppError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_cookies::Cookies;

/// Registration body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Optional display name
    pub username: Option<String>,
}

/// Login body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Confirmation message
    pub message: &'static str,
    /// The signed-in user
    pub user: UserProfile,
}

/// `?redirect=1` on `/me`.
#[derive(Debug, Default, Deserialize)]
pub struct MeQuery {
    /// Any of `1`, `true`, `yes` asks for the redirect shape
    pub redirect: Option<String>,
}

/// Create an account.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// {"email": "fan@example.com", "password": "…", "username": "popcorn"}
/// ```
///
/// Responds `201 {"message": "User registered", "id": "<uuid>"}`.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = state
        .auth
        .register(&request.email, &request.password, request.username.as_deref())
        .await?;
    metrics::record_registration();

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered", "id": user.user_id })),
    ))
}

/// Check credentials and start a session.
///
/// Responds with the user and a `Set-Cookie` carrying the session token.
/// Unknown email and wrong password both answer `401 Invalid credentials`.
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = state.auth.login(&request.email, &request.password).await;
    metrics::record_login(outcome.is_ok());
    let (user, token) = outcome?;

    cookies.add(state.cookie.session(token.token));
    Ok(Json(LoginResponse {
        message: "Logged in",
        user: UserProfile::from(user),
    }))
}

/// End the session by expiring the cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> StatusCode {
    cookies.add(state.cookie.removal());
    StatusCode::NO_CONTENT
}

/// The signed-in user.
///
/// With `?redirect=1` the front end only wants to know where to go:
/// `{"ok": true, "redirect": "<client url>"}`.
pub async fn me(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    Query(query): Query<MeQuery>,
) -> Result<Json<Value>, AppError> {
    let user = state.auth.current_user(&principal).await?;

    let wants_redirect = query
        .redirect
        .as_deref()
        .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    if wants_redirect {
        return Ok(Json(json!({ "ok": true, "redirect": state.client_url })));
    }

    Ok(Json(json!({ "user": UserProfile::from(user) })))
}

/// Upload a profile image (multipart field `avatar`) and attach it to the
/// signed-in user.
pub async fn upload_avatar(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let image = read_image_field(multipart, "avatar").await?;
    let url = state
        .uploads
        .save(&image.file_name, image.content_type.as_deref(), &image.bytes)
        .await?;

    let user = match state.auth.set_profile_image(&principal, &url).await {
        Ok(user) => user,
        Err(e) => {
            state.uploads.discard(&url).await;
            return Err(UploadError::from(e).into());
        },
    };

    Ok(Json(json!({ "user": UserProfile::from(user) })))
}
