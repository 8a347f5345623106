use crate::{PostgresConfig, PostgresError};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Build a connection pool and verify it can reach the server.
///
/// # Errors
///
/// Returns [`PostgresError::Connection`] if no connection can be established
/// within the configured timeout.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, PostgresError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.url)
        .await
        .map_err(PostgresError::Connection)?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "PostgreSQL pool ready"
    );

    Ok(pool)
}

/// Apply the embedded schema migrations.
///
/// # Errors
///
/// Returns [`PostgresError::Migration`] if a migration fails or the applied
/// history disagrees with the embedded one.
pub async fn run_migrations(pool: &PgPool) -> Result<(), PostgresError> {
    MIGRATOR.run(pool).await?;
    tracing::info!(migrations = MIGRATOR.iter().count(), "Database schema up to date");
    Ok(())
}

/// Round-trip a trivial query, for readiness checks.
///
/// # Errors
///
/// Returns [`PostgresError::Query`] if the database does not answer.
pub async fn ping(pool: &PgPool) -> Result<(), PostgresError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
