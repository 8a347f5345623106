//! In-memory stores.

use super::{BookingStore, MovieStore, StoreError, StoreResult};
use crate::types::{Booking, BookingId, BookingStatus, Movie, MovieId, SeatLabel};
use async_trait::async_trait;
use marquee_auth::UserId;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("in-memory store lock poisoned".to_string())
}

/// In-memory movie catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMovieStore {
    movies: Arc<Mutex<Vec<Movie>>>,
}

impl InMemoryMovieStore {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<Movie>>> {
        self.movies.lock().map_err(poisoned)
    }
}

#[async_trait]
impl MovieStore for InMemoryMovieStore {
    async fn list(&self) -> StoreResult<Vec<Movie>> {
        Ok(self.lock()?.clone())
    }

    async fn get(&self, id: MovieId) -> StoreResult<Option<Movie>> {
        Ok(self.lock()?.iter().find(|m| m.id == id).cloned())
    }

    async fn insert(&self, movie: &Movie) -> StoreResult<()> {
        self.lock()?.push(movie.clone());
        Ok(())
    }

    async fn update(&self, movie: &Movie) -> StoreResult<bool> {
        let mut movies = self.lock()?;
        match movies.iter_mut().find(|m| m.id == movie.id) {
            Some(slot) => {
                *slot = movie.clone();
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn delete(&self, id: MovieId) -> StoreResult<bool> {
        let mut movies = self.lock()?;
        let before = movies.len();
        movies.retain(|m| m.id != id);
        Ok(movies.len() != before)
    }
}

/// In-memory booking store.
///
/// One mutex guards both the bookings and the per-showtime seat index, so
/// the availability check and the insert cannot interleave with another
/// insert.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    inner: Arc<Mutex<Ledger>>,
}

#[derive(Debug, Default)]
struct Ledger {
    /// Insertion order
    bookings: Vec<Booking>,
    held: HashMap<(MovieId, String), BTreeSet<SeatLabel>>,
}

impl InMemoryBookingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Ledger>> {
        self.inner.lock().map_err(poisoned)
    }
}

fn newest_first<'a>(bookings: impl DoubleEndedIterator<Item = &'a Booking>) -> Vec<Booking> {
    let mut out: Vec<Booking> = bookings.rev().cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_if_seats_free(&self, booking: &Booking) -> StoreResult<()> {
        let mut ledger = self.lock()?;
        let key = (booking.movie_id, booking.showtime.clone());

        if let Some(held) = ledger.held.get(&key) {
            let contested: Vec<SeatLabel> = booking
                .seats
                .iter()
                .filter(|seat| held.contains(seat))
                .copied()
                .collect();
            if !contested.is_empty() {
                return Err(StoreError::SeatConflict { seats: contested });
            }
        }

        ledger.held.entry(key).or_default().extend(booking.seats.iter().copied());
        ledger.bookings.push(booking.clone());
        Ok(())
    }

    async fn taken_seats(&self, movie_id: MovieId, showtime: Option<&str>) -> StoreResult<Vec<SeatLabel>> {
        let ledger = self.lock()?;
        let taken: BTreeSet<SeatLabel> = ledger
            .held
            .iter()
            .filter(|((movie, label), _)| *movie == movie_id && showtime.is_none_or(|s| s == label))
            .flat_map(|(_, seats)| seats.iter().copied())
            .collect();
        Ok(taken.into_iter().collect())
    }

    async fn get(&self, id: BookingId) -> StoreResult<Option<Booking>> {
        Ok(self.lock()?.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Booking>> {
        let ledger = self.lock()?;
        let mine: Vec<&Booking> = ledger.bookings.iter().filter(|b| b.user_id == user_id).collect();
        Ok(newest_first(mine.into_iter()))
    }

    async fn list_all(&self) -> StoreResult<Vec<Booking>> {
        Ok(newest_first(self.lock()?.bookings.iter()))
    }

    async fn mark_paid(&self, id: BookingId) -> StoreResult<Option<Booking>> {
        let mut ledger = self.lock()?;
        Ok(ledger.bookings.iter_mut().find(|b| b.id == id).map(|booking| {
            booking.status = BookingStatus::Paid;
            booking.clone()
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Money;
    use chrono::{Duration, Utc};

    fn seats(labels: &[&str]) -> Vec<SeatLabel> {
        labels.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn booking(movie_id: MovieId, showtime: &str, labels: &[&str]) -> Booking {
        Booking {
            id: BookingId::new(),
            user_id: UserId::new(),
            movie_id,
            showtime: showtime.to_string(),
            seats: seats(labels),
            ticket_price: Money::from_cents(500),
            total_price: Money::from_cents(500 * labels.len() as u64),
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn overlapping_insert_reports_contested_seats_and_writes_nothing() {
        let store = InMemoryBookingStore::new();
        let movie = MovieId::new();
        store.insert_if_seats_free(&booking(movie, "19:00", &["A1", "A2"])).await.unwrap();

        let clash = booking(movie, "19:00", &["A2", "A3"]);
        let err = store.insert_if_seats_free(&clash).await.unwrap_err();
        assert_eq!(err, StoreError::SeatConflict { seats: seats(&["A2"]) });
        assert!(store.get(clash.id).await.unwrap().is_none());
        assert_eq!(store.taken_seats(movie, Some("19:00")).await.unwrap(), seats(&["A1", "A2"]));
    }

    #[tokio::test]
    async fn showtimes_and_movies_are_independent() {
        let store = InMemoryBookingStore::new();
        let movie = MovieId::new();
        store.insert_if_seats_free(&booking(movie, "19:00", &["B5"])).await.unwrap();
        store.insert_if_seats_free(&booking(movie, "21:00", &["B5", "A1"])).await.unwrap();
        store.insert_if_seats_free(&booking(MovieId::new(), "19:00", &["B5"])).await.unwrap();

        assert_eq!(store.taken_seats(movie, Some("19:00")).await.unwrap(), seats(&["B5"]));
        assert_eq!(store.taken_seats(movie, None).await.unwrap(), seats(&["A1", "B5"]));
        assert!(store.taken_seats(movie, Some("23:00")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let store = InMemoryBookingStore::new();
        let movie = MovieId::new();
        let mut older = booking(movie, "19:00", &["A1"]);
        older.created_at = Utc::now() - Duration::hours(1);
        let mut newer = booking(movie, "19:00", &["A2"]);
        newer.user_id = older.user_id;

        store.insert_if_seats_free(&newer).await.unwrap();
        store.insert_if_seats_free(&older).await.unwrap();

        let mine = store.list_for_user(older.user_id).await.unwrap();
        assert_eq!(mine.iter().map(|b| b.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn mark_paid_updates_status() {
        let store = InMemoryBookingStore::new();
        let pending = booking(MovieId::new(), "19:00", &["C3"]);
        store.insert_if_seats_free(&pending).await.unwrap();

        let paid = store.mark_paid(pending.id).await.unwrap().unwrap();
        assert_eq!(paid.status, BookingStatus::Paid);
        assert!(store.mark_paid(BookingId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn movie_crud() {
        let store = InMemoryMovieStore::new();
        let now = Utc::now();
        let mut movie = Movie {
            id: MovieId::new(),
            title: "Heat".to_string(),
            year: Some(1995),
            poster: None,
            description: None,
            showtimes: vec!["19:00".to_string()],
            ticket_price: Money::from_cents(900),
            rating: None,
            length_minutes: Some(170),
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        store.insert(&movie).await.unwrap();

        movie.title = "Heat (1995)".to_string();
        assert!(store.update(&movie).await.unwrap());
        assert_eq!(store.get(movie.id).await.unwrap().unwrap().title, "Heat (1995)");

        assert!(store.delete(movie.id).await.unwrap());
        assert!(!store.delete(movie.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
