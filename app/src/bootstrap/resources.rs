//! Storage resources for the selected backend.
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let resources = Resources::from_config(&config, Arc::new(SystemClock)).await?;
//! ```

use crate::config::{Config, StorageBackend};
use crate::server::PostgresProbe;
use crate::stores::{
    BookingStore, InMemoryBookingStore, InMemoryMovieStore, MovieStore, PostgresBookingStore,
    PostgresMovieStore,
};
use marquee_auth::UserRepository;
use marquee_auth::stores::{InMemoryUserRepository, PostgresUserRepository};
use marquee_core::environment::Clock;
use marquee_postgres::PostgresError;
use marquee_web::{AlwaysReady, ReadinessProbe};
use std::sync::Arc;
use tracing::info;

/// Stores, clock, and readiness probe shared by every service.
#[derive(Clone)]
pub struct Resources {
    /// Wall clock for timestamps and token expiry
    pub clock: Arc<dyn Clock>,
    /// Accounts
    pub users: Arc<dyn UserRepository>,
    /// Catalog
    pub movies: Arc<dyn MovieStore>,
    /// Bookings and seat holds
    pub bookings: Arc<dyn BookingStore>,
    /// Backend health
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl Resources {
    /// Process-local stores.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            users: Arc::new(InMemoryUserRepository::new()),
            movies: Arc::new(InMemoryMovieStore::new()),
            bookings: Arc::new(InMemoryBookingStore::new()),
            readiness: Arc::new(AlwaysReady),
        }
    }

    /// Connect to `PostgreSQL` and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// [`PostgresError`] if the pool cannot be created or migrations fail.
    pub async fn postgres(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, PostgresError> {
        let pool = marquee_postgres::connect(&config.postgres_config()).await?;
        marquee_postgres::run_migrations(&pool).await?;

        Ok(Self {
            clock,
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            movies: Arc::new(PostgresMovieStore::new(pool.clone())),
            bookings: Arc::new(PostgresBookingStore::new(pool.clone())),
            readiness: Arc::new(PostgresProbe::new(pool)),
        })
    }

    /// Resources for the configured backend.
    ///
    /// # Errors
    ///
    /// [`PostgresError`] when the `PostgreSQL` backend cannot be reached.
    pub async fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, PostgresError> {
        match config.storage.backend {
            StorageBackend::Postgres => {
                info!(max_connections = config.storage.max_connections, "Using PostgreSQL storage");
                Self::postgres(config, clock).await
            },
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory(clock))
            },
        }
    }
}
