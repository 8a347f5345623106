//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id (from the middleware, the header, or fresh)
//! - `ApiJson` / `ApiPath`: `Json` and `Path` whose rejections are [`AppError`] JSON bodies
//!
//! # Examples
//!
//! ```ignore
//! async fn create_movie(
//!     correlation_id: CorrelationId,
//!     ApiJson(draft): ApiJson<MovieRequest>,
//! ) -> Result<Json<MovieResponse>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Creating movie");
//!     // ...
//! }
//! ```

use crate::error::AppError;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::middleware::CORRELATION_ID_HEADER;

/// Correlation ID for request tracing.
///
/// Prefers the id stored by [`correlation_id_layer`](crate::middleware::correlation_id_layer),
/// then the `X-Correlation-ID` header, then a fresh UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// JSON body extractor that rejects with a `BAD_REQUEST` [`AppError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

/// Path extractor that rejects with a `BAD_REQUEST` [`AppError`].
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}
