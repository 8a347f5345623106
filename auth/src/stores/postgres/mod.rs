//! PostgreSQL storage implementations.
//!
//! The schema lives in `marquee-postgres`; run its migrations before use.

pub mod user;

// Re-exports
pub use user::PostgresUserRepository;
