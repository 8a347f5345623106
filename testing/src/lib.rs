//! # Marquee Testing
//!
//! Testing utilities for Marquee reducers and services.
//!
//! - [`FixedClock`] / [`test_clock`]: deterministic time
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`assertions`]: effect assertions
//!
//! ## Example
//!
//! ```ignore
//! use marquee_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(BookingReducer::new())
//!     .with_env(env_with(test_clock()))
//!     .given_state(BookingWorkflow::default())
//!     .when_action(BookingAction::Proceed)
//!     .then_state(|state| assert_eq!(state.phase, BookingPhase::Selecting))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use marquee_core::environment::Clock;

pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use marquee_testing::mocks::FixedClock;
    /// use marquee_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Return a clock fixed `seconds` later than this one
        #[must_use]
        pub fn advanced_by(&self, seconds: i64) -> Self {
            Self::new(self.time + chrono::Duration::seconds(seconds))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_advanced_clock() {
        let clock = test_clock();
        let later = clock.advanced_by(90);
        assert_eq!((later.now() - clock.now()).num_seconds(), 90);
    }
}
