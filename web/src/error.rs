//! HTTP error responses.
//!
//! Every failure leaves the API as `{code, message}` JSON, optionally with a
//! `details` object. Domain error enums convert into [`AppError`] at the
//! handler boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use marquee_auth::AuthError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// ```ignore
/// async fn handler(Path(id): Path<MovieId>) -> Result<Json<Movie>, AppError> {
///     let movie = catalog.get(id).await?; // CatalogError -> AppError
///     Ok(Json(movie))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Machine-readable kind
    code: &'static str,
    /// Structured context for the client (e.g. contested seats)
    details: Option<serde_json::Value>,
    /// Internal error (logged, never exposed to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: None,
            source: None,
        }
    }

    /// Attach the underlying cause, for logging.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach client-visible structured details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable kind
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 400: malformed or missing input.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// 401: no valid session.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")
    }

    /// 403: authenticated but not allowed.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN")
    }

    /// 404 for a resource looked up by id.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND",
        )
    }

    /// 409: uniqueness conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message, "CONFLICT")
    }

    /// 409: some requested seats are already taken. Lists them in `details.seats`.
    #[must_use]
    pub fn seat_conflict<S: fmt::Display>(seats: impl IntoIterator<Item = S>) -> Self {
        let seats: Vec<String> = seats.into_iter().map(|s| s.to_string()).collect();
        Self::new(
            StatusCode::CONFLICT,
            format!("Seats already booked: {}", seats.join(", ")),
            "SEAT_CONFLICT",
        )
        .with_details(serde_json::json!({ "seats": seats }))
    }

    /// 413: upload over the size limit.
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message, "PAYLOAD_TOO_LARGE")
    }

    /// 500 with a generic client message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_SERVER_ERROR")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(message) => Self::bad_request(message),
            AuthError::InvalidRole(_) => Self::bad_request(err.to_string()),
            AuthError::EmailTaken => Self::conflict(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::InvalidToken
            | AuthError::SessionExpired => Self::unauthorized(err.to_string()),
            AuthError::InsufficientPermissions { .. } => Self::forbidden(err.to_string()),
            AuthError::UserNotFound => Self::new(StatusCode::NOT_FOUND, "User not found", "NOT_FOUND"),
            AuthError::DatabaseError(_) | AuthError::InternalError(_) => {
                Self::internal("An internal error occurred").with_source(err)
            },
        }
    }
}
