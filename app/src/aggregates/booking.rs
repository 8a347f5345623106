//! Booking workflow.
//!
//! One reducer drives a single customer's path from seat selection to paid
//! booking:
//!
//! ```text
//! Idle ─StartSelection─▶ Selecting ─Proceed─▶ Draft ─CreateBooking─▶ Confirming ─ConfirmPayment─▶ Paid
//!                          ▲  │ ToggleSeat / RefreshTakenSeats      │
//!                          └──┴──────────── SeatsConflicted ◀──────┘
//! ```
//!
//! Nothing is persisted before `Confirming`. The only write that can race
//! with other customers is `insert_if_seats_free`, which the store performs
//! atomically; losing that race sends the workflow back to `Selecting` with
//! the contested seats marked taken.

use crate::error::BookingError;
use crate::stores::{BookingStore, StoreError};
use crate::types::{
    Booking, BookingDraft, BookingId, BookingStatus, HallLayout, Movie, MovieId, SeatLabel,
};
use marquee_auth::{Principal, UserId};
use marquee_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use std::collections::BTreeSet;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Where the workflow is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// Nothing started
    #[default]
    Idle,
    /// Picking seats for one movie and showtime
    Selecting,
    /// Seats chosen and priced, not yet persisted
    Draft,
    /// Persisted as a `pending` booking
    Confirming,
    /// Payment confirmed (terminal)
    Paid,
}

/// Workflow state for one customer session.
#[derive(Clone, Debug, Default)]
pub struct BookingWorkflow {
    /// Current phase
    pub phase: WorkflowPhase,
    /// Movie being booked
    pub movie: Option<Movie>,
    /// Showtime being booked
    pub showtime: Option<String>,
    /// Seats the customer has picked
    pub selected: BTreeSet<SeatLabel>,
    /// Latest snapshot of seats held by other bookings
    pub taken: BTreeSet<SeatLabel>,
    /// Priced selection, once proceeded
    pub draft: Option<BookingDraft>,
    /// Persisted booking, once created or loaded for payment
    pub booking: Option<Booking>,
    /// Error from the most recent command
    pub last_error: Option<BookingError>,
}

impl BookingWorkflow {
    /// Fresh, idle workflow
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the booking workflow
#[derive(Clone, Debug)]
pub enum BookingAction {
    // Commands
    /// Begin selecting seats for a showtime of `movie`
    StartSelection {
        /// Movie to book
        movie: Movie,
        /// One of `movie.showtimes`
        showtime: String,
    },

    /// Select the seat, or deselect it if already selected
    ToggleSeat {
        /// Seat
        seat: SeatLabel,
    },

    /// Reload the taken-seat snapshot
    RefreshTakenSeats,

    /// Price the selection and move to `Draft`
    Proceed,

    /// Persist the draft as a `pending` booking owned by `owner`
    CreateBooking {
        /// Owner of the new booking
        owner: UserId,
    },

    /// Mark a booking paid
    ConfirmPayment {
        /// Booking to pay
        booking_id: BookingId,
        /// Caller; must own the booking or be an admin
        requester: Principal,
    },

    // Events
    /// Selection began
    SelectionStarted {
        /// Movie
        movie: Movie,
        /// Showtime
        showtime: String,
    },

    /// Taken-seat snapshot arrived from the store
    TakenSeatsLoaded {
        /// Held seats for the screening
        seats: Vec<SeatLabel>,
    },

    /// A seat was selected or deselected
    SeatToggled {
        /// Seat
        seat: SeatLabel,
        /// `true` if now selected
        selected: bool,
    },

    /// Selection priced
    DraftPrepared {
        /// The draft
        draft: BookingDraft,
    },

    /// Store accepted the booking
    BookingCreated {
        /// Persisted booking
        booking: Booking,
    },

    /// Store refused the booking because seats were taken meanwhile
    SeatsConflicted {
        /// Contested seats
        seats: Vec<SeatLabel>,
    },

    /// Booking loaded for payment confirmation
    PaymentTargetLoaded {
        /// The booking, `None` if unknown
        booking: Option<Booking>,
        /// Caller
        requester: Principal,
    },

    /// Booking is paid
    BookingPaid {
        /// Paid booking
        booking: Booking,
    },

    /// A store call failed
    StoreFailed {
        /// Failure description
        error: String,
    },

    /// A command was rejected
    ValidationFailed {
        /// Why
        error: BookingError,
    },
}

impl BookingAction {
    const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::StartSelection { .. }
                | Self::ToggleSeat { .. }
                | Self::RefreshTakenSeats
                | Self::Proceed
                | Self::CreateBooking { .. }
                | Self::ConfirmPayment { .. }
        )
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the booking workflow
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Clock for booking timestamps
    pub clock: Arc<dyn Clock>,
    /// Booking persistence
    pub bookings: Arc<dyn BookingStore>,
    /// Seat grid
    pub layout: HallLayout,
}

impl BookingEnvironment {
    /// Creates a new `BookingEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, bookings: Arc<dyn BookingStore>, layout: HallLayout) -> Self {
        Self {
            clock,
            bookings,
            layout,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the booking workflow
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingReducer;

type Effects = SmallVec<[Effect<BookingAction>; 4]>;

fn invalid(message: impl Into<String>) -> BookingAction {
    BookingAction::ValidationFailed {
        error: BookingError::InvalidInput(message.into()),
    }
}

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn validate_start(state: &BookingWorkflow, movie: &Movie, showtime: &str) -> Result<(), BookingAction> {
        if !matches!(state.phase, WorkflowPhase::Idle | WorkflowPhase::Selecting) {
            return Err(invalid("A booking is already in progress"));
        }
        if !movie.has_showtime(showtime) {
            return Err(invalid(format!(
                "Showtime '{showtime}' is not scheduled for {}",
                movie.title
            )));
        }
        Ok(())
    }

    fn validate_toggle(
        state: &BookingWorkflow,
        seat: SeatLabel,
        layout: HallLayout,
    ) -> Result<bool, BookingAction> {
        if state.phase != WorkflowPhase::Selecting {
            return Err(invalid("No seat selection in progress"));
        }
        if !layout.contains(seat) {
            return Err(invalid(format!("Seat {seat} does not exist in this hall")));
        }
        if state.selected.contains(&seat) {
            return Ok(false);
        }
        if state.taken.contains(&seat) {
            return Err(BookingAction::ValidationFailed {
                error: BookingError::SeatConflict { seats: vec![seat] },
            });
        }
        Ok(true)
    }

    fn prepare_draft(state: &BookingWorkflow) -> Result<BookingDraft, BookingAction> {
        let (WorkflowPhase::Selecting, Some(movie), Some(showtime)) =
            (state.phase, &state.movie, &state.showtime)
        else {
            return Err(invalid("No seat selection in progress"));
        };
        if state.selected.is_empty() {
            return Err(invalid("Select at least one seat"));
        }

        let seats: Vec<SeatLabel> = state.selected.iter().copied().collect();
        let total_price = movie
            .ticket_price
            .checked_mul(seats.len() as u64)
            .ok_or_else(|| invalid("Total price is out of range"))?;

        Ok(BookingDraft {
            movie_id: movie.id,
            showtime: showtime.clone(),
            seats,
            ticket_price: movie.ticket_price,
            total_price,
        })
    }

    /// Applies an event to state
    fn apply_event(state: &mut BookingWorkflow, action: &BookingAction) {
        match action {
            BookingAction::SelectionStarted { movie, showtime } => {
                state.phase = WorkflowPhase::Selecting;
                state.movie = Some(movie.clone());
                state.showtime = Some(showtime.clone());
                state.selected.clear();
                state.taken.clear();
                state.draft = None;
                state.last_error = None;
            },

            BookingAction::TakenSeatsLoaded { seats } => {
                state.taken = seats.iter().copied().collect();
                let taken = &state.taken;
                state.selected.retain(|seat| !taken.contains(seat));
                state.last_error = None;
            },

            BookingAction::SeatToggled { seat, selected } => {
                if *selected {
                    state.selected.insert(*seat);
                } else {
                    state.selected.remove(seat);
                }
                state.last_error = None;
            },

            BookingAction::DraftPrepared { draft } => {
                state.phase = WorkflowPhase::Draft;
                state.draft = Some(draft.clone());
                state.last_error = None;
            },

            BookingAction::BookingCreated { booking } => {
                state.phase = WorkflowPhase::Confirming;
                state.booking = Some(booking.clone());
                state.last_error = None;
            },

            BookingAction::SeatsConflicted { seats } => {
                state.phase = WorkflowPhase::Selecting;
                state.draft = None;
                state.taken.extend(seats.iter().copied());
                for seat in seats {
                    state.selected.remove(seat);
                }
                state.last_error = Some(BookingError::SeatConflict {
                    seats: seats.clone(),
                });
            },

            BookingAction::PaymentTargetLoaded { booking, .. } => {
                state.booking.clone_from(booking);
            },

            BookingAction::BookingPaid { booking } => {
                state.phase = WorkflowPhase::Paid;
                state.booking = Some(booking.clone());
                state.last_error = None;
            },

            BookingAction::StoreFailed { error } => {
                state.last_error = Some(BookingError::Storage(error.clone()));
            },

            BookingAction::ValidationFailed { error } => {
                state.last_error = Some(error.clone());
            },

            // Commands don't modify state
            BookingAction::StartSelection { .. }
            | BookingAction::ToggleSeat { .. }
            | BookingAction::RefreshTakenSeats
            | BookingAction::Proceed
            | BookingAction::CreateBooking { .. }
            | BookingAction::ConfirmPayment { .. } => {},
        }
    }

    fn reject(state: &mut BookingWorkflow, rejection: &BookingAction) -> Effects {
        Self::apply_event(state, rejection);
        SmallVec::new()
    }
}

fn load_taken_seats(env: &BookingEnvironment, movie_id: MovieId, showtime: String) -> Effect<BookingAction> {
    let bookings = Arc::clone(&env.bookings);
    Effect::future(async move {
        Some(match bookings.taken_seats(movie_id, Some(&showtime)).await {
            Ok(seats) => BookingAction::TakenSeatsLoaded { seats },
            Err(e) => BookingAction::StoreFailed { error: e.to_string() },
        })
    })
}

impl Reducer for BookingReducer {
    type State = BookingWorkflow;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) -> Effects {
        if action.is_command() {
            state.last_error = None;
        }

        match action {
            BookingAction::StartSelection { movie, showtime } => {
                if let Err(rejection) = Self::validate_start(state, &movie, &showtime) {
                    return Self::reject(state, &rejection);
                }
                let movie_id = movie.id;
                Self::apply_event(
                    state,
                    &BookingAction::SelectionStarted {
                        movie,
                        showtime: showtime.clone(),
                    },
                );
                smallvec![load_taken_seats(env, movie_id, showtime)]
            },

            BookingAction::RefreshTakenSeats => {
                match (state.phase, &state.movie, &state.showtime) {
                    (WorkflowPhase::Selecting, Some(movie), Some(showtime)) => {
                        smallvec![load_taken_seats(env, movie.id, showtime.clone())]
                    },
                    _ => Self::reject(state, &invalid("No seat selection in progress")),
                }
            },

            BookingAction::ToggleSeat { seat } => match Self::validate_toggle(state, seat, env.layout) {
                Ok(selected) => {
                    Self::apply_event(state, &BookingAction::SeatToggled { seat, selected });
                    SmallVec::new()
                },
                Err(rejection) => Self::reject(state, &rejection),
            },

            BookingAction::Proceed => match Self::prepare_draft(state) {
                Ok(draft) => {
                    Self::apply_event(state, &BookingAction::DraftPrepared { draft });
                    SmallVec::new()
                },
                Err(rejection) => Self::reject(state, &rejection),
            },

            BookingAction::CreateBooking { owner } => {
                let Some(draft) = state.draft.as_ref().filter(|_| state.phase == WorkflowPhase::Draft) else {
                    return Self::reject(state, &invalid("Nothing to book: proceed from seat selection first"));
                };

                let booking = Booking {
                    id: BookingId::new(),
                    user_id: owner,
                    movie_id: draft.movie_id,
                    showtime: draft.showtime.clone(),
                    seats: draft.seats.clone(),
                    ticket_price: draft.ticket_price,
                    total_price: draft.total_price,
                    status: BookingStatus::Pending,
                    created_at: env.clock.now(),
                };

                let bookings = Arc::clone(&env.bookings);
                smallvec![Effect::future(async move {
                    Some(match bookings.insert_if_seats_free(&booking).await {
                        Ok(()) => BookingAction::BookingCreated { booking },
                        Err(StoreError::SeatConflict { seats }) => BookingAction::SeatsConflicted { seats },
                        Err(e) => BookingAction::StoreFailed { error: e.to_string() },
                    })
                })]
            },

            BookingAction::ConfirmPayment {
                booking_id,
                requester,
            } => {
                let bookings = Arc::clone(&env.bookings);
                smallvec![Effect::future(async move {
                    Some(match bookings.get(booking_id).await {
                        Ok(booking) => BookingAction::PaymentTargetLoaded { booking, requester },
                        Err(e) => BookingAction::StoreFailed { error: e.to_string() },
                    })
                })]
            },

            BookingAction::PaymentTargetLoaded {
                ref booking,
                ref requester,
            } => {
                let Some(target) = booking.clone() else {
                    return Self::reject(
                        state,
                        &BookingAction::ValidationFailed {
                            error: BookingError::NotFound("Booking"),
                        },
                    );
                };
                if !requester.can_access(target.user_id) {
                    return Self::reject(
                        state,
                        &BookingAction::ValidationFailed {
                            error: BookingError::Forbidden,
                        },
                    );
                }

                Self::apply_event(state, &action);

                if target.status == BookingStatus::Paid {
                    Self::apply_event(state, &BookingAction::BookingPaid { booking: target });
                    return SmallVec::new();
                }

                let bookings = Arc::clone(&env.bookings);
                smallvec![Effect::future(async move {
                    Some(match bookings.mark_paid(target.id).await {
                        Ok(Some(booking)) => BookingAction::BookingPaid { booking },
                        Ok(None) => BookingAction::ValidationFailed {
                            error: BookingError::NotFound("Booking"),
                        },
                        Err(e) => BookingAction::StoreFailed { error: e.to_string() },
                    })
                })]
            },

            // Events (fed back from effects)
            event => {
                Self::apply_event(state, &event);
                SmallVec::new()
            },
        }
    }
}
