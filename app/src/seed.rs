//! Bulk catalog import for the `marquee-seed` binary.
//!
//! Reads movies in the same JSON shape the admin UI posts to
//! `POST /api/movies`, either a bare array or `{ "movies": [...] }`, and
//! creates them through [`CatalogService::create`] as the bootstrap admin.
//! Titles already in the catalog are skipped, so reruns are harmless.

use crate::error::CatalogError;
use crate::services::{CatalogService, MovieInput};
use marquee_auth::{AuthError, Principal, Role, UserRepository};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Seeding failures that stop the run.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The seed file is not a movie list
    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    /// No account with the admin email
    #[error("no account for {0}; register it before seeding")]
    AdminMissing(String),

    /// The account exists but is not an admin
    #[error("{0} is not an admin")]
    NotAdmin(String),

    /// Account lookup failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog read or write failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// What one seeding run did.
#[derive(Debug, Default)]
pub struct SeedReport {
    /// Movies created
    pub created: usize,
    /// Titles already present
    pub skipped: usize,
    /// Entries rejected by validation, with the reason
    pub rejected: Vec<(String, String)>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedFile {
    List(Vec<MovieInput>),
    Wrapped { movies: Vec<MovieInput> },
}

/// Parse a seed file.
///
/// # Errors
///
/// [`SeedError::Parse`] if `raw` is neither a movie array nor `{ "movies": [...] }`.
pub fn parse_movies(raw: &str) -> Result<Vec<MovieInput>, SeedError> {
    Ok(match serde_json::from_str(raw)? {
        SeedFile::List(movies) | SeedFile::Wrapped { movies } => movies,
    })
}

/// The admin account seeding runs as.
///
/// # Errors
///
/// [`SeedError::AdminMissing`] or [`SeedError::NotAdmin`] when `email` does
/// not name an admin account.
pub async fn admin_principal(users: &dyn UserRepository, email: &str) -> Result<Principal, SeedError> {
    let email = marquee_auth::utils::normalize_email(email);
    let user = users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| SeedError::AdminMissing(email.clone()))?;
    if user.role != Role::Admin {
        return Err(SeedError::NotAdmin(email));
    }
    Ok(Principal {
        id: user.user_id,
        email: user.email,
        role: user.role,
    })
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Create every movie whose title is not yet in the catalog.
///
/// Entries that fail validation are reported and skipped.
///
/// # Errors
///
/// [`SeedError::Catalog`] for storage failures or a non-admin `admin`.
#[tracing::instrument(skip(catalog, admin, movies), fields(count = movies.len()))]
pub async fn seed_catalog(
    catalog: &CatalogService,
    admin: &Principal,
    movies: Vec<MovieInput>,
) -> Result<SeedReport, SeedError> {
    let mut known: HashSet<String> = catalog
        .list()
        .await?
        .iter()
        .map(|movie| title_key(&movie.title))
        .collect();

    let mut report = SeedReport::default();
    for input in movies {
        let label = input.title.clone().unwrap_or_default();
        let key = title_key(&label);
        if !key.is_empty() && known.contains(&key) {
            tracing::debug!(title = %label, "Already in catalog");
            report.skipped += 1;
            continue;
        }

        match catalog.create(admin, input).await {
            Ok(movie) => {
                tracing::debug!(movie_id = %movie.id, "Seeded movie");
                known.insert(key);
                report.created += 1;
            },
            Err(CatalogError::InvalidInput(reason)) => {
                tracing::warn!(title = %label, %reason, "Skipping invalid movie");
                report.rejected.push((label, reason));
            },
            Err(e) => return Err(e.into()),
        }
    }
    Ok(report)
}
