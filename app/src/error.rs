//! Domain errors and their HTTP mapping.

use crate::stores::{StoreError, format_seats};
use crate::types::SeatLabel;
use marquee_auth::AuthError;
use marquee_web::AppError;
use thiserror::Error;

/// Booking workflow and booking query failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Malformed or inconsistent request
    #[error("{0}")]
    InvalidInput(String),

    /// Requested seats are held by another booking
    #[error("Seats already booked: {}", format_seats(.seats))]
    SeatConflict {
        /// The contested seats
        seats: Vec<SeatLabel>,
    },

    /// Unknown movie or booking
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller neither owns the booking nor is an admin
    #[error("Access denied")]
    Forbidden,

    /// Store failure
    #[error("Storage failure: {0}")]
    Storage(String),

    /// The workflow runtime gave up
    #[error("Workflow failure: {0}")]
    Runtime(#[from] marquee_runtime::StoreError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SeatConflict { seats } => Self::SeatConflict { seats },
            StoreError::Database(message) => Self::Storage(message),
        }
    }
}

/// Movie catalog failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Invalid movie fields
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown movie id
    #[error("Movie not found")]
    NotFound,

    /// Not an admin
    #[error("Admin access required")]
    Forbidden,

    /// Store failure
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Upload failures.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Missing field or unsupported type
    #[error("{0}")]
    InvalidInput(String),

    /// Over the size limit
    #[error("File exceeds the {limit} byte limit")]
    TooLarge {
        /// Limit in bytes
        limit: usize,
    },

    /// Writing the file failed
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),

    /// Recording the avatar failed
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidInput(message) => Self::bad_request(message),
            BookingError::SeatConflict { seats } => Self::seat_conflict(seats),
            BookingError::NotFound(what) => Self::new(
                axum::http::StatusCode::NOT_FOUND,
                format!("{what} not found"),
                "NOT_FOUND",
            ),
            BookingError::Forbidden => Self::forbidden("Access denied"),
            BookingError::Storage(_) | BookingError::Runtime(_) => {
                Self::internal("An internal error occurred").with_source(err)
            },
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidInput(message) => Self::bad_request(message),
            CatalogError::NotFound => Self::new(
                axum::http::StatusCode::NOT_FOUND,
                "Movie not found",
                "NOT_FOUND",
            ),
            CatalogError::Forbidden => Self::forbidden(err.to_string()),
            CatalogError::Storage(_) => Self::internal("An internal error occurred").with_source(err),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidInput(message) => Self::bad_request(message),
            UploadError::TooLarge { .. } => Self::payload_too_large(err.to_string()),
            UploadError::Io(_) => Self::internal("An internal error occurred").with_source(err),
            UploadError::Auth(auth) => auth.into(),
        }
    }
}
