//! Movie catalog: public reads, admin-only writes.

use crate::error::CatalogError;
use crate::metrics;
use crate::stores::MovieStore;
use crate::types::{Money, Movie, MovieId};
use marquee_auth::Principal;
use marquee_core::environment::Clock;
use serde::Deserialize;
use std::sync::Arc;

/// Movie fields as sent by the admin UI.
///
/// Used for both create and partial update; on update an absent field is
/// left unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    /// Title
    pub title: Option<String>,
    /// Release year
    pub year: Option<i32>,
    /// Poster URL
    pub poster: Option<String>,
    /// Synopsis
    pub description: Option<String>,
    /// Showtime labels
    pub showtimes: Option<Vec<String>>,
    /// Ticket price in currency units
    pub ticket_price: Option<f64>,
    /// Rating, 0 to 10
    pub rating: Option<f64>,
    /// Running time in minutes
    pub length: Option<u32>,
}

fn title(raw: &str) -> Result<String, CatalogError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CatalogError::InvalidInput("Title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Trim labels, reject blanks, drop repeats keeping the first.
fn showtimes(raw: &[String]) -> Result<Vec<String>, CatalogError> {
    let mut labels: Vec<String> = Vec::with_capacity(raw.len());
    for label in raw {
        let label = label.trim();
        if label.is_empty() {
            return Err(CatalogError::InvalidInput(
                "Showtimes must not be blank".to_string(),
            ));
        }
        if !labels.iter().any(|seen| seen == label) {
            labels.push(label.to_string());
        }
    }
    Ok(labels)
}

fn ticket_price(units: f64) -> Result<Money, CatalogError> {
    Money::from_units(units).ok_or_else(|| {
        CatalogError::InvalidInput(
            "ticketPrice must be a non-negative amount with at most two decimals".to_string(),
        )
    })
}

fn rating(value: f64) -> Result<f64, CatalogError> {
    if (0.0..=10.0).contains(&value) {
        Ok(value)
    } else {
        Err(CatalogError::InvalidInput(
            "rating must be between 0 and 10".to_string(),
        ))
    }
}

/// Lengths must fit the `INTEGER` column.
fn length(minutes: u32) -> Result<u32, CatalogError> {
    i32::try_from(minutes)
        .map(|_| minutes)
        .map_err(|_| CatalogError::InvalidInput("length is out of range".to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    movies: Arc<dyn MovieStore>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    /// Create the service.
    #[must_use]
    pub fn new(movies: Arc<dyn MovieStore>, clock: Arc<dyn Clock>) -> Self {
        Self { movies, clock }
    }

    /// All movies, oldest first.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Storage`] if the store fails.
    pub async fn list(&self) -> Result<Vec<Movie>, CatalogError> {
        Ok(self.movies.list().await?)
    }

    /// One movie.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] for an unknown id.
    pub async fn get(&self, id: MovieId) -> Result<Movie, CatalogError> {
        self.movies.get(id).await?.ok_or(CatalogError::NotFound)
    }

    /// Add a movie.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] unless `requester` is an admin
    /// - [`CatalogError::InvalidInput`] for a blank title, blank showtime,
    ///   bad price, or out-of-range rating or length
    #[tracing::instrument(skip(self, requester, input), fields(requester = %requester.id))]
    pub async fn create(&self, requester: &Principal, input: MovieInput) -> Result<Movie, CatalogError> {
        requester.require_admin().map_err(|_| CatalogError::Forbidden)?;

        let now = self.clock.now();
        let movie = Movie {
            id: MovieId::new(),
            title: title(input.title.as_deref().unwrap_or_default())?,
            year: input.year,
            poster: non_blank(input.poster),
            description: non_blank(input.description),
            showtimes: showtimes(input.showtimes.as_deref().unwrap_or_default())?,
            ticket_price: input.ticket_price.map_or(Ok(Money::ZERO), ticket_price)?,
            rating: input.rating.map(rating).transpose()?,
            length_minutes: input.length.map(length).transpose()?,
            created_by: Some(requester.id),
            created_at: now,
            updated_at: now,
        };

        self.movies.insert(&movie).await?;
        metrics::record_movie("created");
        tracing::info!(movie_id = %movie.id, title = %movie.title, "Movie created");
        Ok(movie)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] unless `requester` is an admin
    /// - [`CatalogError::NotFound`] for an unknown id
    /// - [`CatalogError::InvalidInput`] as for [`Self::create`]
    #[tracing::instrument(skip(self, requester, patch), fields(requester = %requester.id))]
    pub async fn update(&self, requester: &Principal, id: MovieId, patch: MovieInput) -> Result<Movie, CatalogError> {
        requester.require_admin().map_err(|_| CatalogError::Forbidden)?;
        let mut movie = self.get(id).await?;

        if let Some(raw) = patch.title.as_deref() {
            movie.title = title(raw)?;
        }
        if let Some(year) = patch.year {
            movie.year = Some(year);
        }
        if patch.poster.is_some() {
            movie.poster = non_blank(patch.poster);
        }
        if patch.description.is_some() {
            movie.description = non_blank(patch.description);
        }
        if let Some(raw) = patch.showtimes.as_deref() {
            movie.showtimes = showtimes(raw)?;
        }
        if let Some(units) = patch.ticket_price {
            movie.ticket_price = ticket_price(units)?;
        }
        if let Some(value) = patch.rating {
            movie.rating = Some(rating(value)?);
        }
        if let Some(minutes) = patch.length {
            movie.length_minutes = Some(length(minutes)?);
        }
        movie.updated_at = self.clock.now();

        if !self.movies.update(&movie).await? {
            return Err(CatalogError::NotFound);
        }
        metrics::record_movie("updated");
        tracing::info!(movie_id = %movie.id, "Movie updated");
        Ok(movie)
    }

    /// Remove a movie. Its bookings keep their dangling reference.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Forbidden`] unless `requester` is an admin
    /// - [`CatalogError::NotFound`] for an unknown id
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn delete(&self, requester: &Principal, id: MovieId) -> Result<(), CatalogError> {
        requester.require_admin().map_err(|_| CatalogError::Forbidden)?;
        if !self.movies.delete(id).await? {
            return Err(CatalogError::NotFound);
        }
        metrics::record_movie("deleted");
        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stores::InMemoryMovieStore;
    use marquee_auth::{Role, UserId};
    use marquee_testing::test_clock;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(InMemoryMovieStore::new()), Arc::new(test_clock()))
    }

    fn admin() -> Principal {
        Principal {
            id: UserId::new(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
        }
    }

    fn guest() -> Principal {
        Principal {
            id: UserId::new(),
            email: "guest@example.com".to_string(),
            role: Role::Guest,
        }
    }

    fn input(title: &str) -> MovieInput {
        MovieInput {
            title: Some(title.to_string()),
            showtimes: Some(vec![" 19:00 ".to_string(), "21:30".to_string(), "19:00".to_string()]),
            ticket_price: Some(12.5),
            ..MovieInput::default()
        }
    }

    #[tokio::test]
    async fn admin_creates_normalized_movie() {
        let catalog = service();
        let admin = admin();
        let movie = catalog.create(&admin, input("  Alien ")).await.unwrap();

        assert_eq!(movie.title, "Alien");
        assert_eq!(movie.showtimes, vec!["19:00", "21:30"]);
        assert_eq!(movie.ticket_price, Money::from_cents(1250));
        assert_eq!(movie.created_by, Some(admin.id));
        assert_eq!(catalog.get(movie.id).await.unwrap(), movie);
    }

    #[tokio::test]
    async fn guests_cannot_write() {
        let catalog = service();
        assert_eq!(
            catalog.create(&guest(), input("Alien")).await.unwrap_err(),
            CatalogError::Forbidden
        );

        let movie = catalog.create(&admin(), input("Alien")).await.unwrap();
        assert_eq!(
            catalog.delete(&guest(), movie.id).await.unwrap_err(),
            CatalogError::Forbidden
        );
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let catalog = service();
        let admin = admin();
        let cases = [
            MovieInput { title: Some("   ".into()), ..MovieInput::default() },
            MovieInput { ticket_price: Some(-1.0), ..input("Alien") },
            MovieInput { ticket_price: Some(1.005), ..input("Alien") },
            MovieInput { rating: Some(11.0), ..input("Alien") },
            MovieInput { length: Some(u32::MAX), ..input("Alien") },
            MovieInput { showtimes: Some(vec!["19:00".into(), " ".into()]), ..input("Alien") },
        ];
        for case in cases {
            assert!(matches!(
                catalog.create(&admin, case).await,
                Err(CatalogError::InvalidInput(_))
            ));
        }
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_length_is_rejected_on_update() {
        let catalog = service();
        let admin = admin();
        let movie = catalog
            .create(&admin, MovieInput { length: Some(117), ..input("Alien") })
            .await
            .unwrap();

        let patch = MovieInput { length: Some(u32::MAX), ..MovieInput::default() };
        assert!(matches!(
            catalog.update(&admin, movie.id, patch).await,
            Err(CatalogError::InvalidInput(_))
        ));
        assert_eq!(catalog.get(movie.id).await.unwrap().length_minutes, Some(117));
    }

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let catalog = service();
        let admin = admin();
        let movie = catalog.create(&admin, input("Alien")).await.unwrap();

        let patched = catalog
            .update(
                &admin,
                movie.id,
                MovieInput {
                    rating: Some(8.4),
                    ticket_price: Some(10.0),
                    ..MovieInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.title, "Alien");
        assert_eq!(patched.showtimes, movie.showtimes);
        assert_eq!(patched.rating, Some(8.4));
        assert_eq!(patched.ticket_price, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn unknown_movie_is_not_found() {
        let catalog = service();
        let admin = admin();
        let missing = MovieId::new();
        assert_eq!(catalog.get(missing).await.unwrap_err(), CatalogError::NotFound);
        assert_eq!(
            catalog.update(&admin, missing, MovieInput::default()).await.unwrap_err(),
            CatalogError::NotFound
        );
        assert_eq!(catalog.delete(&admin, missing).await.unwrap_err(), CatalogError::NotFound);
    }
}
