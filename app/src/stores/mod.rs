//! Persistence for movies and bookings.
//!
//! Each store is a trait object so the service layer runs unchanged over the
//! in-memory implementations (tests, `STORAGE_BACKEND=memory`) and the
//! `PostgreSQL` ones.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryBookingStore, InMemoryMovieStore};
pub use postgres::{PostgresBookingStore, PostgresMovieStore};

use crate::types::{Booking, BookingId, Movie, MovieId, SeatLabel};
use async_trait::async_trait;
use marquee_auth::UserId;
use thiserror::Error;

/// Store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Some requested seats already belong to another booking for the same
    /// movie and showtime. Nothing was written.
    #[error("seats already booked: {}", format_seats(.seats))]
    SeatConflict {
        /// The contested seats, sorted
        seats: Vec<SeatLabel>,
    },

    /// The backend failed
    #[error("storage error: {0}")]
    Database(String),
}

pub(crate) fn format_seats(seats: &[SeatLabel]) -> String {
    seats
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Movie catalog persistence.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// All movies, oldest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn list(&self) -> StoreResult<Vec<Movie>>;

    /// One movie, `None` if absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn get(&self, id: MovieId) -> StoreResult<Option<Movie>>;

    /// Insert a new movie.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn insert(&self, movie: &Movie) -> StoreResult<()>;

    /// Replace a stored movie. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn update(&self, movie: &Movie) -> StoreResult<bool>;

    /// Delete a movie. Returns `false` if it does not exist. Bookings that
    /// reference it are left alone.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn delete(&self, id: MovieId) -> StoreResult<bool>;
}

/// Booking persistence, including the seat-exclusive insert.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert `booking` only if none of its seats is held by another booking
    /// for the same movie and showtime. Check and insert are one atomic step.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SeatConflict`] naming the seats already taken
    /// - [`StoreError::Database`] on backend failure
    async fn insert_if_seats_free(&self, booking: &Booking) -> StoreResult<()>;

    /// Union of seats held by bookings for `movie_id`, restricted to one
    /// showtime when given. Sorted by row then column, without duplicates.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn taken_seats(&self, movie_id: MovieId, showtime: Option<&str>) -> StoreResult<Vec<SeatLabel>>;

    /// One booking, `None` if absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn get(&self, id: BookingId) -> StoreResult<Option<Booking>>;

    /// A user's bookings, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Booking>>;

    /// Every booking, newest first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn list_all(&self) -> StoreResult<Vec<Booking>>;

    /// Set status to `paid`. Returns the updated booking, `None` if absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on backend failure.
    async fn mark_paid(&self, id: BookingId) -> StoreResult<Option<Booking>>;
}
