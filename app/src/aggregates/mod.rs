//! Reducers for the booking backend.
//!
//! - Booking: seat selection, draft, confirmation and payment for one customer

pub mod booking;

pub use booking::{BookingAction, BookingEnvironment, BookingReducer, BookingWorkflow, WorkflowPhase};
