//! Application services.
//!
//! Each service takes the caller's [`Principal`](marquee_auth::Principal)
//! explicitly and returns a domain error; the HTTP layer maps those to
//! responses.

pub mod bookings;
pub mod catalog;
pub mod uploads;

pub use bookings::{BookingService, CreateBookingRequest};
pub use catalog::{CatalogService, MovieInput};
pub use uploads::{UPLOADS_URL_PREFIX, UploadService, sanitize_filename};
