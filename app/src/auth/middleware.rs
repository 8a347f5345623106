//! Session extractor for the booking API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use marquee::auth::middleware::SessionUser;
//!
//! async fn my_bookings(
//!     State(state): State<AppState>,
//!     SessionUser(principal): SessionUser,
//! ) -> Result<Json<Value>, AppError> {
//!     let bookings = state.bookings.list_for_user(&principal).await?;
//!     Ok(Json(json!({ "bookings": bookings })))
//! }
//! ```

use crate::server::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use marquee_auth::{Principal, utils::bearer_token};
use marquee_web::AppError;
use tower_cookies::Cookies;

/// Authenticated caller.
///
/// Reads the token from `Authorization: Bearer <token>` first, then from
/// the session cookie. Rejects with 401 when neither yields a valid token.
#[derive(Debug, Clone)]
pub struct SessionUser(pub Principal);

/// Token from an `Authorization: Bearer` header, if any.
#[must_use]
pub fn authorization_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match authorization_token(&parts.headers) {
            Some(token) => token.to_string(),
            None => {
                let cookies = Cookies::from_request_parts(parts, state)
                    .await
                    .map_err(|(_, message)| AppError::internal(message))?;
                state
                    .cookie
                    .token(&cookies)
                    .ok_or_else(|| AppError::unauthorized("Not authenticated"))?
            },
        };

        let principal = state.auth.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::from(e)
        })?;

        Ok(Self(principal))
    }
}
