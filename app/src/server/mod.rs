//! HTTP server module for the booking backend.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - The `PostgreSQL` readiness probe
//! - Router configuration

pub mod health;
pub mod routes;
pub mod state;

pub use health::PostgresProbe;
pub use routes::build_router;
pub use state::AppState;
