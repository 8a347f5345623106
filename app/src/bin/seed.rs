//! Load movies into the catalog from a JSON file.
//!
//! ```text
//! marquee-seed movies.json
//! SEED_FILE=movies.json marquee-seed
//! ```
//!
//! Runs as the `ADMIN_EMAIL` account, which must already be registered.

use anyhow::{Context, bail};
use marquee::{
    bootstrap::Resources,
    config::{Config, StorageBackend},
    seed::{admin_principal, parse_movies, seed_catalog},
    services::CatalogService,
};
use marquee_core::environment::SystemClock;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,marquee=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(path) = std::env::args().nth(1).or_else(|| std::env::var("SEED_FILE").ok()) else {
        bail!("usage: marquee-seed <movies.json> (or set SEED_FILE)");
    };
    let Some(admin_email) = config.auth.admin_email.clone() else {
        bail!("ADMIN_EMAIL must name the admin account to seed as");
    };
    if config.storage.backend == StorageBackend::Memory {
        warn!("STORAGE_BACKEND=memory: seeded movies vanish when this process exits");
    }

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let movies = parse_movies(&raw)?;
    info!(path = %path, count = movies.len(), "Seeding catalog");

    let resources = Resources::from_config(&config, Arc::new(SystemClock))
        .await
        .context("failed to initialise storage")?;
    let admin = admin_principal(resources.users.as_ref(), &admin_email).await?;
    let catalog = CatalogService::new(Arc::clone(&resources.movies), Arc::clone(&resources.clock));

    let report = seed_catalog(&catalog, &admin, movies).await?;
    for (title, reason) in &report.rejected {
        warn!(title = %title, reason = %reason, "Rejected");
    }
    info!(
        created = report.created,
        skipped = report.skipped,
        rejected = report.rejected.len(),
        "Seeding finished"
    );
    Ok(())
}
