//! Axum integration for Marquee.
//!
//! The HTTP shell around the booking core: it turns domain errors into JSON
//! responses, extracts request metadata, and tags every request with a
//! correlation id.
//!
//! # Request Flow
//!
//! 1. **Correlation id** assigned by [`correlation_id_layer`]
//! 2. **Extract** body and path with [`ApiJson`] / [`ApiPath`] (rejections are JSON)
//! 3. **Call** a service with the caller's `Principal`
//! 4. **Map** domain errors into [`AppError`] via `?`
//!
//! # Example
//!
//! ```ignore
//! use marquee_web::{ApiJson, AppError};
//!
//! async fn register(
//!     State(state): State<AppState>,
//!     ApiJson(body): ApiJson<RegisterRequest>,
//! ) -> Result<impl IntoResponse, AppError> {
//!     let user = state.auth.register(&body.email, &body.password, None).await?;
//!     Ok((StatusCode::CREATED, Json(json!({ "id": user.user_id }))))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, CorrelationId};
pub use handlers::{AlwaysReady, ReadinessProbe};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
