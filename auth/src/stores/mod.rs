//! [`UserRepository`](crate::providers::UserRepository) implementations.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryUserRepository;

#[cfg(feature = "postgres")]
pub use postgres::PostgresUserRepository;
