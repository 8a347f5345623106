//! `PostgreSQL` plumbing shared by the Marquee stores.
//!
//! - [`PostgresConfig`] and [`connect`]: pool construction from configuration
//! - [`run_migrations`]: the embedded schema (users, movies, bookings, seat holds)
//! - [`is_unique_violation`]: constraint-violation detection for stores that
//!   translate it into a domain error
//!
//! # Example
//!
//! ```ignore
//! use marquee_postgres::{connect, run_migrations, PostgresConfig};
//!
//! let pool = connect(&PostgresConfig::from_url("postgres://localhost/marquee")).await?;
//! run_migrations(&pool).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod pool;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use config::PostgresConfig;
pub use error::{PostgresError, is_unique_violation};
pub use pool::{connect, ping, run_migrations};
pub use sqlx::PgPool;
