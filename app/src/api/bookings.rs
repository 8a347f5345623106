//! Booking API endpoints.
//!
//! - GET /api/bookings/movie/:movieId?showtime= - Taken seats (public)
//! - GET /api/bookings - Caller's bookings
//! - GET /api/bookings/all - Every booking (admin)
//! - POST /api/bookings - Book seats
//! - GET /api/bookings/:id - One booking with its movie (owner or admin)
//! - PATCH /api/bookings/:id - Confirm payment with `{"status": "paid"}`

use crate::auth::middleware::SessionUser;
use crate::server::state::AppState;
use crate::services::CreateBookingRequest;
use crate::types::{Booking, BookingDetails, BookingId, BookingStatus, MovieId, SeatLabel};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use marquee_web::{ApiJson, ApiPath, AppError};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query for the taken-seat lookup.
#[derive(Debug, Default, Deserialize)]
pub struct TakenSeatsQuery {
    /// Restrict to one showtime; all showtimes when absent or blank
    pub showtime: Option<String>,
}

/// Taken seats.
#[derive(Debug, Serialize)]
pub struct TakenSeatsResponse {
    /// Seats held by any booking, sorted
    pub seats: Vec<SeatLabel>,
}

/// Booking list.
#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    /// Bookings, newest first
    pub bookings: Vec<Booking>,
}

/// A single booking.
#[derive(Debug, Serialize)]
pub struct BookingResponse<T> {
    /// The booking
    pub booking: T,
}

/// Body of `PATCH /api/bookings/:id`.
#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    /// Only `"paid"` is accepted
    pub status: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Seats already held for a movie.
pub async fn taken_seats(
    State(state): State<AppState>,
    ApiPath(movie_id): ApiPath<MovieId>,
    Query(query): Query<TakenSeatsQuery>,
) -> Result<Json<TakenSeatsResponse>, AppError> {
    let showtime = query.showtime.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let seats = state.bookings.taken_seats(movie_id, showtime).await?;
    Ok(Json(TakenSeatsResponse { seats }))
}

/// The caller's bookings.
pub async fn my_bookings(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
) -> Result<Json<BookingsResponse>, AppError> {
    let bookings = state.bookings.list_for_user(&principal).await?;
    Ok(Json(BookingsResponse { bookings }))
}

/// Every booking.
pub async fn all_bookings(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
) -> Result<Json<BookingsResponse>, AppError> {
    let bookings = state.bookings.list_all(&principal).await?;
    Ok(Json(BookingsResponse { bookings }))
}

/// Book seats. Conflicts answer `409 SEAT_CONFLICT` with the contested
/// seats in `details.seats`.
pub async fn create_booking(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse<Booking>>), AppError> {
    let booking = state.bookings.create_booking(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse { booking })))
}

/// One booking, with its movie embedded (`null` once deleted).
pub async fn get_booking(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<BookingResponse<BookingDetails>>, AppError> {
    let booking = state.bookings.get_booking(&principal, id).await?;
    Ok(Json(BookingResponse { booking }))
}

/// Confirm (mock) payment.
pub async fn update_booking(
    State(state): State<AppState>,
    SessionUser(principal): SessionUser,
    ApiPath(id): ApiPath<BookingId>,
    ApiJson(request): ApiJson<UpdateBookingRequest>,
) -> Result<Json<BookingResponse<Booking>>, AppError> {
    match request.status.as_deref().map(str::parse::<BookingStatus>) {
        Some(Ok(BookingStatus::Paid)) => {},
        _ => return Err(AppError::bad_request("Only {\"status\": \"paid\"} is supported")),
    }

    let booking = state.bookings.confirm_payment(&principal, id).await?;
    Ok(Json(BookingResponse { booking }))
}
