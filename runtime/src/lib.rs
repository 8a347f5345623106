//! # Marquee Runtime
//!
//! Store runtime for Marquee reducers.
//!
//! A [`Store`] owns one piece of state, a reducer, and an environment. Sending
//! an action runs the reducer, executes the returned effects, and feeds every
//! action those effects produce back into the reducer until nothing is left
//! to do. HTTP handlers build one store per request, so `send` resolving means
//! the whole workflow step has settled and the state can be read back.
//!
//! ## Example
//!
//! ```ignore
//! use marquee_runtime::Store;
//!
//! let store = Store::new(BookingWorkflow::default(), BookingReducer::new(), env);
//! store.send(BookingAction::Proceed).await?;
//! let phase = store.state(|s| s.phase).await;
//! ```

use futures::future::{BoxFuture, join_all};
use marquee_core::{effect::Effect, reducer::Reducer};
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The reducer kept producing actions past the configured limit
        ///
        /// Usually means two actions are feeding each other in a loop.
        #[error("Action feedback exceeded {0} steps")]
        FeedbackLimitExceeded(usize),
    }
}

pub use error::StoreError;

/// Default cap on reducer invocations triggered by a single `send`.
pub const DEFAULT_MAX_FEEDBACK_STEPS: usize = 64;

/// The Store - runtime for a reducer
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: RwLock<S>,
    reducer: R,
    environment: E,
    max_feedback_steps: usize,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync,
    A: Send + std::fmt::Debug + 'static,
    S: Send + Sync,
    E: Send + Sync,
{
    /// Create a new store with initial state, reducer, and environment
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self {
            state: RwLock::new(initial_state),
            reducer,
            environment,
            max_feedback_steps: DEFAULT_MAX_FEEDBACK_STEPS,
        }
    }

    /// Override the feedback step limit
    #[must_use]
    pub const fn with_max_feedback_steps(mut self, steps: usize) -> Self {
        self.max_feedback_steps = steps;
        self
    }

    /// Send an action and drive every resulting effect to completion
    ///
    /// Actions produced by effects are reduced in the order their effects
    /// finish. The state lock is held only while the reducer runs, never while
    /// an effect is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FeedbackLimitExceeded`] if more than the
    /// configured number of actions are reduced for this call.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        let mut queue = std::collections::VecDeque::from([action]);
        let mut steps = 0usize;

        while let Some(next) = queue.pop_front() {
            steps += 1;
            if steps > self.max_feedback_steps {
                tracing::error!(limit = self.max_feedback_steps, "Store feedback limit exceeded");
                return Err(StoreError::FeedbackLimitExceeded(self.max_feedback_steps));
            }

            tracing::trace!(action = ?next, "Reducing action");
            let effects = {
                let mut state = self.state.write().await;
                self.reducer.reduce(&mut state, next, &self.environment)
            };

            for effect in effects {
                queue.extend(execute(effect).await);
            }
        }

        Ok(())
    }

    /// Read state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Consume the store and return the final state
    pub fn into_state(self) -> S {
        self.state.into_inner()
    }
}

/// Execute one effect description, collecting the actions it produces
fn execute<A: Send + 'static>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>> {
    Box::pin(async move {
        match effect {
            Effect::None => Vec::new(),
            Effect::Future(fut) => fut.await.into_iter().collect(),
            Effect::Sequential(effects) => {
                let mut actions = Vec::new();
                for effect in effects {
                    actions.extend(execute(effect).await);
                }
                actions
            },
            Effect::Parallel(effects) => join_all(effects.into_iter().map(execute))
                .await
                .into_iter()
                .flatten()
                .collect(),
        }
    })
}
