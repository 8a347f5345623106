use thiserror::Error;

/// Errors raised while connecting to or preparing the database.
#[derive(Debug, Error)]
pub enum PostgresError {
    /// The pool could not be created or a connection could not be acquired.
    #[error("Failed to connect to PostgreSQL: {0}")]
    Connection(#[source] sqlx::Error),

    /// Applying the embedded schema failed.
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A query failed.
    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),

    /// A throwaway test database could not be provisioned.
    #[cfg(feature = "test-support")]
    #[error("Test container failed: {0}")]
    Container(String),
}

/// Returns `true` if `error` was raised by a `UNIQUE` or primary-key constraint.
#[must_use]
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
