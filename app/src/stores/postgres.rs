//! `PostgreSQL` stores.
//!
//! Seat exclusivity comes from the `booking_seats` primary key
//! `(movie_id, showtime, seat)`: a booking row and its seat rows are written
//! in one transaction, and a key violation rolls the whole booking back.

use super::{BookingStore, MovieStore, StoreError, StoreResult};
use crate::types::{Booking, BookingId, BookingStatus, Money, Movie, MovieId, SeatLabel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_auth::UserId;
use marquee_postgres::is_unique_violation;
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

const MOVIE_COLUMNS: &str = "id, title, year, poster, description, showtimes, ticket_price_cents, \
     rating, length_minutes, created_by, created_at, updated_at";

const BOOKING_COLUMNS: &str =
    "id, user_id, movie_id, showtime, seats, ticket_price_cents, total_price_cents, status, created_at";

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Database(format!("{context}: {e}"))
}

fn cents_to_db(money: Money) -> StoreResult<i64> {
    i64::try_from(money.cents()).map_err(|_| StoreError::Database(format!("amount {money} out of range")))
}

fn cents_from_db(cents: i64) -> StoreResult<Money> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| StoreError::Database(format!("negative amount in storage: {cents}")))
}

fn parse_seats(raw: &[String]) -> StoreResult<Vec<SeatLabel>> {
    raw.iter()
        .map(|s| {
            s.parse::<SeatLabel>()
                .map_err(|e| StoreError::Database(format!("corrupt seat in storage: {e}")))
        })
        .collect()
}

fn seat_strings(seats: &[SeatLabel]) -> Vec<String> {
    seats.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Movies
// ============================================================================

/// `PostgreSQL` movie catalog.
#[derive(Clone, Debug)]
pub struct PostgresMovieStore {
    pool: PgPool,
}

impl PostgresMovieStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    year: Option<i32>,
    poster: Option<String>,
    description: Option<String>,
    showtimes: Vec<String>,
    ticket_price_cents: i64,
    rating: Option<f64>,
    length_minutes: Option<i32>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MovieRow> for Movie {
    type Error = StoreError;

    fn try_from(row: MovieRow) -> StoreResult<Self> {
        Ok(Self {
            id: MovieId::from_uuid(row.id),
            title: row.title,
            year: row.year,
            poster: row.poster,
            description: row.description,
            showtimes: row.showtimes,
            ticket_price: cents_from_db(row.ticket_price_cents)?,
            rating: row.rating,
            length_minutes: row.length_minutes.map(length_from_db).transpose()?,
            created_by: row.created_by.map(UserId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn length_from_db(minutes: i32) -> StoreResult<u32> {
    u32::try_from(minutes)
        .map_err(|_| StoreError::Database(format!("negative length in storage: {minutes}")))
}

fn length_to_db(movie: &Movie) -> StoreResult<Option<i32>> {
    movie
        .length_minutes
        .map(|minutes| {
            i32::try_from(minutes)
                .map_err(|_| StoreError::Database(format!("length out of range: {minutes}")))
        })
        .transpose()
}

#[async_trait]
impl MovieStore for PostgresMovieStore {
    async fn list(&self) -> StoreResult<Vec<Movie>> {
        sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list movies"))?
        .into_iter()
        .map(Movie::try_from)
        .collect()
    }

    async fn get(&self, id: MovieId) -> StoreResult<Option<Movie>> {
        sqlx::query_as::<_, MovieRow>(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get movie"))?
            .map(Movie::try_from)
            .transpose()
    }

    async fn insert(&self, movie: &Movie) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO movies (id, title, year, poster, description, showtimes, ticket_price_cents,
                                rating, length_minutes, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(movie.id.as_uuid())
        .bind(&movie.title)
        .bind(movie.year)
        .bind(&movie.poster)
        .bind(&movie.description)
        .bind(&movie.showtimes)
        .bind(cents_to_db(movie.ticket_price)?)
        .bind(movie.rating)
        .bind(length_to_db(movie)?)
        .bind(movie.created_by.map(|u| u.0))
        .bind(movie.created_at)
        .bind(movie.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert movie"))?;
        Ok(())
    }

    async fn update(&self, movie: &Movie) -> StoreResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE movies
            SET title = $2, year = $3, poster = $4, description = $5, showtimes = $6,
                ticket_price_cents = $7, rating = $8, length_minutes = $9, updated_at = $10
            WHERE id = $1
            ",
        )
        .bind(movie.id.as_uuid())
        .bind(&movie.title)
        .bind(movie.year)
        .bind(&movie.poster)
        .bind(&movie.description)
        .bind(&movie.showtimes)
        .bind(cents_to_db(movie.ticket_price)?)
        .bind(movie.rating)
        .bind(length_to_db(movie)?)
        .bind(movie.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update movie"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: MovieId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete movie"))?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// `PostgreSQL` booking store.
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Which of `seats` are currently held for the screening.
    async fn held_among(&self, booking: &Booking) -> StoreResult<Vec<SeatLabel>> {
        let held: Vec<String> = sqlx::query_scalar(
            "SELECT seat FROM booking_seats WHERE movie_id = $1 AND showtime = $2 AND seat = ANY($3)",
        )
        .bind(booking.movie_id.as_uuid())
        .bind(&booking.showtime)
        .bind(seat_strings(&booking.seats))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to read held seats"))?;

        let mut held = parse_seats(&held)?;
        held.sort();
        Ok(held)
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    showtime: String,
    seats: Vec<String>,
    ticket_price_cents: i64,
    total_price_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> StoreResult<Self> {
        let mut seats = parse_seats(&row.seats)?;
        seats.sort();
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            user_id: UserId(row.user_id),
            movie_id: MovieId::from_uuid(row.movie_id),
            showtime: row.showtime,
            seats,
            ticket_price: cents_from_db(row.ticket_price_cents)?,
            total_price: cents_from_db(row.total_price_cents)?,
            status: row.status.parse::<BookingStatus>().map_err(StoreError::Database)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id))]
    async fn insert_if_seats_free(&self, booking: &Booking) -> StoreResult<()> {
        let seats = seat_strings(&booking.seats);
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;

        sqlx::query(
            r"
            INSERT INTO bookings (id, user_id, movie_id, showtime, seats, ticket_price_cents,
                                  total_price_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.0)
        .bind(booking.movie_id.as_uuid())
        .bind(&booking.showtime)
        .bind(&seats)
        .bind(cents_to_db(booking.ticket_price)?)
        .bind(cents_to_db(booking.total_price)?)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert booking"))?;

        let held = sqlx::query(
            r"
            INSERT INTO booking_seats (movie_id, showtime, seat, booking_id)
            SELECT $1, $2, seat, $4 FROM UNNEST($3::text[]) AS seat
            ",
        )
        .bind(booking.movie_id.as_uuid())
        .bind(&booking.showtime)
        .bind(&seats)
        .bind(booking.id.as_uuid())
        .execute(&mut *tx)
        .await;

        match held {
            Ok(_) => {
                tx.commit().await.map_err(db_error("Failed to commit booking"))?;
                Ok(())
            },
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await.map_err(db_error("Failed to roll back booking"))?;
                let contested = self.held_among(booking).await?;
                tracing::debug!(contested = contested.len(), "Seat hold rejected by unique key");
                Err(StoreError::SeatConflict {
                    seats: if contested.is_empty() {
                        booking.seats.clone()
                    } else {
                        contested
                    },
                })
            },
            Err(e) => Err(db_error("Failed to hold seats")(e)),
        }
    }

    async fn taken_seats(&self, movie_id: MovieId, showtime: Option<&str>) -> StoreResult<Vec<SeatLabel>> {
        let raw: Vec<String> = sqlx::query_scalar(
            "SELECT seat FROM booking_seats WHERE movie_id = $1 AND ($2::text IS NULL OR showtime = $2)",
        )
        .bind(movie_id.as_uuid())
        .bind(showtime)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to read taken seats"))?;

        let taken: BTreeSet<SeatLabel> = parse_seats(&raw)?.into_iter().collect();
        Ok(taken.into_iter().collect())
    }

    async fn get(&self, id: BookingId) -> StoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get booking"))?
            .map(Booking::try_from)
            .transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list bookings"))?
        .into_iter()
        .map(Booking::try_from)
        .collect()
    }

    async fn list_all(&self) -> StoreResult<Vec<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list bookings"))?
        .into_iter()
        .map(Booking::try_from)
        .collect()
    }

    async fn mark_paid(&self, id: BookingId) -> StoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = 'paid' WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to mark booking paid"))?
        .map(Booking::try_from)
        .transpose()
    }
}
