//! Business metrics for the booking backend.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `marquee_bookings_total{status}` - Bookings by outcome (created, paid, rejected)
//! - `marquee_seat_conflicts_total` - Booking attempts refused because seats were taken
//! - `marquee_logins_total{outcome}` - Login attempts (success, failure)
//! - `marquee_registrations_total` - Accounts created
//! - `marquee_movies_total{operation}` - Catalog writes (created, updated, deleted)
//! - `marquee_uploads_total` - Files stored

use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "marquee_bookings_total",
        "Total number of bookings by status (created, paid, rejected)"
    );
    describe_counter!(
        "marquee_seat_conflicts_total",
        "Booking attempts refused because a requested seat was already taken"
    );
    describe_counter!(
        "marquee_logins_total",
        "Login attempts by outcome (success, failure)"
    );
    describe_counter!("marquee_registrations_total", "Total accounts registered");
    describe_counter!(
        "marquee_movies_total",
        "Catalog writes by operation (created, updated, deleted)"
    );
    describe_counter!("marquee_uploads_total", "Total files uploaded");

    tracing::info!("Business metrics registered");
}

/// Record a booking lifecycle step.
pub fn record_booking(status: &'static str) {
    metrics::counter!("marquee_bookings_total", "status" => status).increment(1);
    tracing::debug!(status, "Recorded booking metric");
}

/// Record a seat conflict.
pub fn record_seat_conflict(seats: usize) {
    metrics::counter!("marquee_seat_conflicts_total").increment(1);
    tracing::debug!(seats, "Recorded seat conflict metric");
}

/// Record a login attempt.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("marquee_logins_total", "outcome" => outcome).increment(1);
}

/// Record a registration.
pub fn record_registration() {
    metrics::counter!("marquee_registrations_total").increment(1);
}

/// Record a catalog write.
pub fn record_movie(operation: &'static str) {
    metrics::counter!("marquee_movies_total", "operation" => operation).increment(1);
    tracing::debug!(operation, "Recorded movie metric");
}

/// Record a stored upload.
pub fn record_upload() {
    metrics::counter!("marquee_uploads_total").increment(1);
}
