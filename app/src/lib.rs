//! Marquee - a movie ticket booking backend
//!
//! Public movie catalog, seat selection and booking, mock payment
//! confirmation, and an admin back-office for movies and user roles.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (axum)         api/, auth/          JSON in/out, session extraction
//!        │
//!   Services            services/            validation, authorization, metrics
//!        │
//!   Booking workflow    aggregates/booking   Selecting → Draft → Confirming → Paid
//!        │                                   (reducer run by marquee-runtime)
//!   Stores              stores/              in-memory or PostgreSQL
//! ```
//!
//! # No double booking
//!
//! For one movie and showtime, the seat sets of all bookings are pairwise
//! disjoint. The booking store checks and inserts in one atomic step: a
//! single lock in memory, a transaction over a `UNIQUE (movie, showtime,
//! seat)` table in `PostgreSQL`. A request that loses the race gets
//! `409 SEAT_CONFLICT` naming the contested seats.
//!
//! # Usage
//!
//! See [`aggregates::booking`] for the workflow and its tests, and
//! [`server::build_router`] for the HTTP surface.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregates;
pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod metrics;
pub mod seed;
pub mod server;
pub mod services;
pub mod stores;
pub mod types;

pub use aggregates::{BookingAction, BookingReducer, BookingWorkflow};
pub use config::Config;
pub use error::{BookingError, CatalogError, UploadError};
pub use types::*;
