//! API endpoints for the booking backend.
//!
//! This module contains the HTTP handlers organized by domain:
//! - Movies: public catalog reads, admin writes
//! - Bookings: seat availability, booking, payment confirmation
//! - Admin: user search and role changes
//! - Uploads: image storage

pub mod admin;
pub mod bookings;
pub mod movies;
pub mod uploads;
