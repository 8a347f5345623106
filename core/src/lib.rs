//! # Marquee Core
//!
//! Core traits and types for the Marquee booking backend.
//!
//! Business workflows are written as reducers: pure functions that take the
//! current state, an action, and an injected environment, mutate the state in
//! place, and return descriptions of side effects. The runtime crate executes
//! those effects and feeds any resulting actions back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for one workflow instance
//! - **Action**: All possible inputs to a reducer (commands and events)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use marquee_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Default)]
//! struct CartState {
//!     seats: Vec<String>,
//! }
//!
//! enum CartAction {
//!     AddSeat(String),
//! }
//!
//! struct CartReducer;
//!
//! impl Reducer for CartReducer {
//!     type State = CartState;
//!     type Action = CartAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CartState,
//!         action: CartAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CartAction>; 4]> {
//!         match action {
//!             CartAction::AddSeat(seat) => state.seats.push(seat),
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CartState::default();
//! let effects = CartReducer.reduce(&mut state, CartAction::AddSeat("A1".into()), &());
//! assert_eq!(state.seats, vec!["A1".to_string()]);
//! assert_eq!(effects.len(), 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all business rules and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Validates the action, updates state in place, and returns effect
        /// descriptions for the runtime to execute. Most actions produce at
        /// most a handful of effects, so the result is stack-allocated up to four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe work to be performed by the runtime. They are values,
/// not execution, so reducers stay pure and tests can inspect them.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future produced by an [`Effect::Future`].
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are returned from reducers
    /// and executed by the `Store` in the runtime crate.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently; their resulting actions are fed back in completion order
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(EffectFuture<Action>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block whose output is fed back as the next action
        #[must_use]
        pub fn future<F>(future: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(future))
        }

        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
