//! Concurrency tests for seat booking.
//!
//! Races many overlapping booking requests for one screening and checks that
//! the winners hold pairwise-disjoint seats and every loser was told exactly
//! which seats it lost.
//!
//! Run with: `cargo test --test concurrency_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use futures::future::join_all;
use marquee::services::{BookingService, CreateBookingRequest};
use marquee::stores::{BookingStore, InMemoryBookingStore, InMemoryMovieStore, MovieStore};
use marquee::{BookingError, HallLayout, Money, Movie, MovieId, SeatLabel};
use marquee_auth::{Principal, Role, UserId};
use marquee_core::environment::SystemClock;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

struct Screening {
    service: BookingService,
    bookings: Arc<InMemoryBookingStore>,
    movie_id: MovieId,
}

async fn screening() -> Screening {
    let movies = Arc::new(InMemoryMovieStore::new());
    let bookings = Arc::new(InMemoryBookingStore::new());
    let now = chrono::Utc::now();
    let movie = Movie {
        id: MovieId::new(),
        title: "Rush Hour".to_string(),
        year: Some(1998),
        poster: None,
        description: None,
        showtimes: vec!["19:00".to_string()],
        ticket_price: Money::from_cents(1000),
        rating: None,
        length_minutes: Some(98),
        created_by: None,
        created_at: now,
        updated_at: now,
    };
    movies.insert(&movie).await.unwrap();

    let service = BookingService::new(
        movies,
        Arc::clone(&bookings) as Arc<dyn BookingStore>,
        Arc::new(SystemClock),
        HallLayout::default(),
    );
    Screening {
        service,
        bookings,
        movie_id: movie.id,
    }
}

fn customer() -> Principal {
    Principal {
        id: UserId::new(),
        email: "racer@example.com".to_string(),
        role: Role::Guest,
    }
}

fn request(movie_id: MovieId, seats: &[String]) -> CreateBookingRequest {
    CreateBookingRequest {
        movie_id,
        showtime: "19:00".to_string(),
        seats: seats.to_vec(),
        ticket_price: None,
        total_price: None,
    }
}

/// Race all `requests` and check the outcome.
///
/// Returns the number of successful bookings.
async fn race_and_verify(screening: &Screening, requests: &[Vec<String>]) -> usize {
    let outcomes = join_all(requests.iter().map(|seats| {
        let service = screening.service.clone();
        let request = request(screening.movie_id, seats);
        tokio::spawn(async move { service.create_booking(&customer(), request).await })
    }))
    .await;

    let mut held: BTreeSet<SeatLabel> = BTreeSet::new();
    let mut losers = Vec::new();
    let mut winners = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            Ok(booking) => {
                winners += 1;
                for seat in &booking.seats {
                    assert!(held.insert(*seat), "seat {seat} was booked twice");
                }
            },
            Err(BookingError::SeatConflict { seats }) => {
                assert!(!seats.is_empty());
                losers.push(seats);
            },
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // Contested seats must really be held by someone
    for contested in losers {
        for seat in contested {
            assert!(held.contains(&seat), "{seat} reported as contested but is free");
        }
    }

    let taken: BTreeSet<SeatLabel> = screening
        .bookings
        .taken_seats(screening.movie_id, Some("19:00"))
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(taken, held);

    winners
}

fn seats(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}

/// Fifty customers want the same seat; exactly one gets it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_race() {
    let screening = screening().await;
    let requests: Vec<Vec<String>> = (0..50).map(|_| seats(&["E5"])).collect();

    let winners = race_and_verify(&screening, &requests).await;

    assert_eq!(winners, 1);
}

/// Overlapping pairs along a row: a chain where each request shares one seat
/// with its neighbours.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_chains_never_double_book() {
    let screening = screening().await;
    let requests: Vec<Vec<String>> = (1..10_u8)
        .map(|column| vec![format!("B{column}"), format!("B{}", column + 1)])
        .collect();

    let winners = race_and_verify(&screening, &requests).await;

    assert!((1..=5).contains(&winners));
}

/// Disjoint requests all succeed regardless of interleaving.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_requests_all_succeed() {
    let screening = screening().await;
    let requests: Vec<Vec<String>> = ["A", "B", "C", "D", "E", "F", "G", "H"]
        .iter()
        .map(|row| vec![format!("{row}1"), format!("{row}2"), format!("{row}3")])
        .collect();

    let winners = race_and_verify(&screening, &requests).await;

    assert_eq!(winners, 8);
    let taken = screening.bookings.taken_seats(screening.movie_id, None).await.unwrap();
    assert_eq!(taken.len(), 24);
}

fn seat_sets() -> impl Strategy<Value = Vec<Vec<String>>> {
    // A small pool of seats keeps collisions frequent
    let seat = (0_u8..2, 1_u8..6).prop_map(|(row, column)| format!("{}{column}", char::from(b'A' + row)));
    prop::collection::vec(prop::collection::btree_set(seat, 1..4), 1..12)
        .prop_map(|sets| sets.into_iter().map(|set| set.into_iter().collect()).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn concurrent_bookings_hold_disjoint_seats(requests in seat_sets()) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let winners = runtime.block_on(async {
            let screening = screening().await;
            race_and_verify(&screening, &requests).await
        });
        prop_assert!(winners >= 1);
    }
}
