//! Booking service: seat availability, booking creation, payment, and reads.
//!
//! Creation and payment run the [`BookingReducer`] in a per-request
//! [`Store`]; reads go straight to the stores.

use crate::aggregates::{BookingAction, BookingEnvironment, BookingReducer, BookingWorkflow};
use crate::error::BookingError;
use crate::metrics;
use crate::stores::{BookingStore, MovieStore};
use crate::types::{Booking, BookingDetails, BookingId, HallLayout, Money, MovieId, SeatLabel};
use marquee_auth::Principal;
use marquee_core::environment::Clock;
use marquee_runtime::Store;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Body of `POST /api/bookings`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Movie
    pub movie_id: MovieId,
    /// Showtime label
    pub showtime: String,
    /// Seat labels as typed
    pub seats: Vec<String>,
    /// Client's idea of the ticket price, checked if present
    pub ticket_price: Option<Money>,
    /// Client's idea of the total, checked if present
    pub total_price: Option<Money>,
}

type Workflow = Store<BookingWorkflow, BookingAction, BookingEnvironment, BookingReducer>;

/// Send a command and surface the error it left behind, if any.
async fn dispatch(store: &Workflow, action: BookingAction) -> Result<(), BookingError> {
    store.send(action).await?;
    match store.state(|s| s.last_error.clone()).await {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Booking service.
#[derive(Clone)]
pub struct BookingService {
    movies: Arc<dyn MovieStore>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    layout: HallLayout,
}

impl BookingService {
    /// Create the service.
    #[must_use]
    pub fn new(
        movies: Arc<dyn MovieStore>,
        bookings: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        layout: HallLayout,
    ) -> Self {
        Self {
            movies,
            bookings,
            clock,
            layout,
        }
    }

    /// The seat grid bookings are validated against.
    #[must_use]
    pub const fn layout(&self) -> HallLayout {
        self.layout
    }

    fn workflow(&self) -> Workflow {
        Store::new(
            BookingWorkflow::new(),
            BookingReducer::new(),
            BookingEnvironment::new(Arc::clone(&self.clock), Arc::clone(&self.bookings), self.layout),
        )
    }

    fn parse_seats(&self, raw: &[String]) -> Result<Vec<SeatLabel>, BookingError> {
        let mut seen = BTreeSet::new();
        let mut seats = Vec::with_capacity(raw.len());
        for label in raw {
            let seat = self
                .layout
                .parse_seat(label)
                .map_err(|e| BookingError::InvalidInput(e.to_string()))?;
            if !seen.insert(seat) {
                return Err(BookingError::InvalidInput(format!("Seat {seat} is listed twice")));
            }
            seats.push(seat);
        }
        Ok(seats)
    }

    /// Seats held for a movie, across all showtimes when `showtime` is `None`.
    ///
    /// # Errors
    ///
    /// [`BookingError::Storage`] if the store fails.
    pub async fn taken_seats(&self, movie_id: MovieId, showtime: Option<&str>) -> Result<Vec<SeatLabel>, BookingError> {
        Ok(self.bookings.taken_seats(movie_id, showtime).await?)
    }

    /// Book seats for the caller.
    ///
    /// Runs the workflow from selection through draft to a persisted
    /// `pending` booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidInput`] for no seats, malformed or repeated
    ///   seats, an unknown showtime, or client prices that differ from the
    ///   server's
    /// - [`BookingError::NotFound`] for an unknown movie
    /// - [`BookingError::SeatConflict`] naming every requested seat that is
    ///   already held
    #[tracing::instrument(skip(self, owner, request), fields(user_id = %owner.id, movie_id = %request.movie_id))]
    pub async fn create_booking(&self, owner: &Principal, request: CreateBookingRequest) -> Result<Booking, BookingError> {
        let result = self.run_creation(owner, request).await;
        match &result {
            Ok(booking) => {
                metrics::record_booking("created");
                tracing::info!(
                    booking_id = %booking.id,
                    seats = booking.seats.len(),
                    total = %booking.total_price,
                    "Booking created"
                );
            },
            Err(BookingError::SeatConflict { seats }) => {
                metrics::record_seat_conflict(seats.len());
                metrics::record_booking("rejected");
                tracing::info!(contested = seats.len(), "Booking refused: seats taken");
            },
            Err(error) => {
                metrics::record_booking("rejected");
                tracing::debug!(%error, "Booking rejected");
            },
        }
        result
    }

    async fn run_creation(&self, owner: &Principal, request: CreateBookingRequest) -> Result<Booking, BookingError> {
        let seats = self.parse_seats(&request.seats)?;
        let movie = self
            .movies
            .get(request.movie_id)
            .await?
            .ok_or(BookingError::NotFound("Movie"))?;

        let store = self.workflow();
        dispatch(
            &store,
            BookingAction::StartSelection {
                movie,
                showtime: request.showtime.trim().to_string(),
            },
        )
        .await?;

        let mut contested = Vec::new();
        for seat in seats {
            match dispatch(&store, BookingAction::ToggleSeat { seat }).await {
                Ok(()) => {},
                Err(BookingError::SeatConflict { seats }) => contested.extend(seats),
                Err(other) => return Err(other),
            }
        }
        if !contested.is_empty() {
            contested.sort_unstable();
            return Err(BookingError::SeatConflict { seats: contested });
        }

        dispatch(&store, BookingAction::Proceed).await?;
        let draft = store
            .state(|s| s.draft.clone())
            .await
            .ok_or_else(|| BookingError::Storage("draft missing after proceed".to_string()))?;

        if request.ticket_price.is_some_and(|price| price != draft.ticket_price) {
            return Err(BookingError::InvalidInput(format!(
                "ticketPrice does not match the current price of {}",
                draft.ticket_price
            )));
        }
        if request.total_price.is_some_and(|total| total != draft.total_price) {
            return Err(BookingError::InvalidInput(format!(
                "totalPrice does not match the expected total of {}",
                draft.total_price
            )));
        }

        dispatch(&store, BookingAction::CreateBooking { owner: owner.id }).await?;
        store
            .state(|s| s.booking.clone())
            .await
            .ok_or_else(|| BookingError::Storage("booking missing after create".to_string()))
    }

    /// Mark a booking paid. Confirming a paid booking returns it unchanged.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] for an unknown booking
    /// - [`BookingError::Forbidden`] unless `requester` owns it or is an admin
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn confirm_payment(&self, requester: &Principal, booking_id: BookingId) -> Result<Booking, BookingError> {
        let store = self.workflow();
        dispatch(
            &store,
            BookingAction::ConfirmPayment {
                booking_id,
                requester: requester.clone(),
            },
        )
        .await?;

        let booking = store
            .state(|s| s.booking.clone())
            .await
            .ok_or(BookingError::NotFound("Booking"))?;
        metrics::record_booking("paid");
        tracing::info!(booking_id = %booking.id, "Booking paid");
        Ok(booking)
    }

    /// One booking with its movie, `movie` being `None` if it was deleted.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] for an unknown booking
    /// - [`BookingError::Forbidden`] unless `requester` owns it or is an admin
    pub async fn get_booking(&self, requester: &Principal, booking_id: BookingId) -> Result<BookingDetails, BookingError> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(BookingError::NotFound("Booking"))?;
        if !requester.can_access(booking.user_id) {
            return Err(BookingError::Forbidden);
        }
        let movie = self.movies.get(booking.movie_id).await?;
        Ok(BookingDetails { booking, movie })
    }

    /// The caller's bookings, newest first.
    ///
    /// # Errors
    ///
    /// [`BookingError::Storage`] if the store fails.
    pub async fn list_for_user(&self, requester: &Principal) -> Result<Vec<Booking>, BookingError> {
        Ok(self.bookings.list_for_user(requester.id).await?)
    }

    /// Every booking, newest first.
    ///
    /// # Errors
    ///
    /// [`BookingError::Forbidden`] unless `requester` is an admin.
    pub async fn list_all(&self, requester: &Principal) -> Result<Vec<Booking>, BookingError> {
        if !requester.is_admin() {
            return Err(BookingError::Forbidden);
        }
        Ok(self.bookings.list_all().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::stores::{InMemoryBookingStore, InMemoryMovieStore};
    use crate::types::{BookingStatus, Movie};
    use marquee_auth::{Role, UserId};
    use marquee_testing::test_clock;

    struct Fixture {
        service: BookingService,
        movies: Arc<InMemoryMovieStore>,
        movie: Movie,
    }

    async fn fixture() -> Fixture {
        let movies = Arc::new(InMemoryMovieStore::new());
        let now = chrono::Utc::now();
        let movie = Movie {
            id: MovieId::new(),
            title: "Heat".to_string(),
            year: Some(1995),
            poster: None,
            description: None,
            showtimes: vec!["19:00".to_string(), "22:00".to_string()],
            ticket_price: Money::from_cents(900),
            rating: None,
            length_minutes: Some(170),
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        movies.insert(&movie).await.unwrap();

        let service = BookingService::new(
            movies.clone(),
            Arc::new(InMemoryBookingStore::new()),
            Arc::new(test_clock()),
            HallLayout::default(),
        );
        Fixture { service, movies, movie }
    }

    fn user(role: Role) -> Principal {
        Principal {
            id: UserId::new(),
            email: "fan@example.com".to_string(),
            role,
        }
    }

    fn request(movie_id: MovieId, seats: &[&str]) -> CreateBookingRequest {
        CreateBookingRequest {
            movie_id,
            showtime: "19:00".to_string(),
            seats: seats.iter().map(|s| (*s).to_string()).collect(),
            ticket_price: None,
            total_price: None,
        }
    }

    fn labels(raw: &[&str]) -> Vec<SeatLabel> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn booking_holds_seats_and_prices_them() {
        let f = fixture().await;
        let fan = user(Role::Guest);
        let booking = f
            .service
            .create_booking(&fan, request(f.movie.id, &["a2", "A1"]))
            .await
            .unwrap();

        assert_eq!(booking.user_id, fan.id);
        assert_eq!(booking.seats, labels(&["A1", "A2"]));
        assert_eq!(booking.total_price, Money::from_cents(1800));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.created_at, test_clock().now());

        let taken = f.service.taken_seats(f.movie.id, Some("19:00")).await.unwrap();
        assert_eq!(taken, labels(&["A1", "A2"]));
        assert!(f.service.taken_seats(f.movie.id, Some("22:00")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlapping_request_names_every_contested_seat() {
        let f = fixture().await;
        f.service
            .create_booking(&user(Role::Guest), request(f.movie.id, &["B1", "B2", "B3"]))
            .await
            .unwrap();

        let err = f
            .service
            .create_booking(&user(Role::Guest), request(f.movie.id, &["B3", "B4", "B1"]))
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::SeatConflict { seats: labels(&["B1", "B3"]) });
        assert!(f.service.list_all(&user(Role::Admin)).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn malformed_requests_are_invalid_input() {
        let f = fixture().await;
        let fan = user(Role::Guest);
        let cases = [
            request(f.movie.id, &[]),
            request(f.movie.id, &["A1", "a1"]),
            request(f.movie.id, &["K1"]),
            request(f.movie.id, &["1A"]),
            CreateBookingRequest {
                showtime: "09:00".to_string(),
                ..request(f.movie.id, &["A1"])
            },
            CreateBookingRequest {
                ticket_price: Some(Money::from_cents(100)),
                ..request(f.movie.id, &["A1"])
            },
            CreateBookingRequest {
                total_price: Some(Money::from_cents(900)),
                ..request(f.movie.id, &["A1", "A2"])
            },
        ];
        for case in cases {
            assert!(matches!(
                f.service.create_booking(&fan, case).await,
                Err(BookingError::InvalidInput(_))
            ));
        }
        assert!(f.service.taken_seats(f.movie.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn matching_client_prices_are_accepted() {
        let f = fixture().await;
        let booking = f
            .service
            .create_booking(
                &user(Role::Guest),
                CreateBookingRequest {
                    ticket_price: Some(Money::from_cents(900)),
                    total_price: Some(Money::from_cents(1800)),
                    ..request(f.movie.id, &["C1", "C2"])
                },
            )
            .await
            .unwrap();
        assert_eq!(booking.total_price, Money::from_cents(1800));
    }

    #[tokio::test]
    async fn unknown_movie_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .create_booking(&user(Role::Guest), request(MovieId::new(), &["A1"]))
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::NotFound("Movie"));
    }

    #[tokio::test]
    async fn ownership_gates_reads_and_payment() {
        let f = fixture().await;
        let owner = user(Role::Guest);
        let stranger = user(Role::Guest);
        let admin = user(Role::Admin);
        let booking = f
            .service
            .create_booking(&owner, request(f.movie.id, &["D4"]))
            .await
            .unwrap();

        assert!(f.service.get_booking(&owner, booking.id).await.is_ok());
        assert!(f.service.get_booking(&admin, booking.id).await.is_ok());
        assert_eq!(
            f.service.get_booking(&stranger, booking.id).await.unwrap_err(),
            BookingError::Forbidden
        );
        assert_eq!(
            f.service.confirm_payment(&stranger, booking.id).await.unwrap_err(),
            BookingError::Forbidden
        );
        assert_eq!(
            f.service.list_all(&owner).await.unwrap_err(),
            BookingError::Forbidden
        );

        let paid = f.service.confirm_payment(&owner, booking.id).await.unwrap();
        assert_eq!(paid.status, BookingStatus::Paid);
        let again = f.service.confirm_payment(&admin, booking.id).await.unwrap();
        assert_eq!(again, paid);

        assert_eq!(
            f.service.confirm_payment(&owner, BookingId::new()).await.unwrap_err(),
            BookingError::NotFound("Booking")
        );
    }

    #[tokio::test]
    async fn deleted_movie_leaves_booking_readable() {
        let f = fixture().await;
        let owner = user(Role::Guest);
        let booking = f
            .service
            .create_booking(&owner, request(f.movie.id, &["E5"]))
            .await
            .unwrap();

        let details = f.service.get_booking(&owner, booking.id).await.unwrap();
        assert_eq!(details.movie.as_ref().map(|m| m.id), Some(f.movie.id));

        f.movies.delete(f.movie.id).await.unwrap();
        let details = f.service.get_booking(&owner, booking.id).await.unwrap();
        assert!(details.movie.is_none());
        assert_eq!(details.booking, booking);
        assert_eq!(f.service.list_for_user(&owner).await.unwrap(), vec![booking]);
    }
}
