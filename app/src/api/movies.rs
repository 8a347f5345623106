//! Movie catalog API endpoints.
//!
//! - GET /api/movies - List movies (public)
//! - GET /api/movies/:id - One movie (public)
//! - POST /api/movies - Create (admin)
//! - PATCH /api/movies/:id - Partial update (admin)
//! - DELETE /api/movies/:id - Delete (admin)

use crate::auth::middleware::SessionUser;
use crate::server::state::AppState;
use crate::services::MovieInput;
use crate::types::{Movie, MovieId};
use axum::{Json, extract::State, http::StatusCode};
use marquee_web::{ApiJson, ApiPath, AppError};
use serde::Serialize;

// ============================================================================
// Response Types
// ============================================================================

/// Movie list.
#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    /// Movies, oldest first
    pub movies: Vec<Movie>,
}

/// A single movie wrapped for write responses.
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    /// The movie
    pub movie: Movie,
}

/// Confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Message
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the catalog.
pub async fn list_movies(State(state): State<AppState>) -> Result<Json<MoviesResponse>, AppError> {
    let movies = state.catalog.list().await?;
    Ok(Json(MoviesResponse { movies }))
}

/// Fetch one movie. The body is the bare movie object.
pub async fn get_movie(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MovieId>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(state.catalog.get(id).await?))
}

/// Create a movie.
pub async fn create_movie(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiJson(input): ApiJson<MovieInput>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    let movie = state.catalog.create(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(MovieResponse { movie })))
}

/// Update the given fields of a movie.
pub async fn update_movie(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiPath(id): ApiPath<MovieId>,
    ApiJson(patch): ApiJson<MovieInput>,
) -> Result<Json<MovieResponse>, AppError> {
    let movie = state.catalog.update(&principal, id, patch).await?;
    Ok(Json(MovieResponse { movie }))
}

/// Delete a movie. Existing bookings keep pointing at it.
pub async fn delete_movie(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiPath(id): ApiPath<MovieId>,
) -> Result<Json<MessageResponse>, AppError> {
    state.catalog.delete(&principal, id).await?;
    Ok(Json(MessageResponse {
        message: "Movie deleted",
    }))
}
