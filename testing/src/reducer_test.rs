//! Given-When-Then harness for reducers
//!
//! Reducers are pure, so a test is: build a state, reduce one or more actions,
//! then inspect the resulting state and the effects returned by the last step.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use marquee_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test builder
///
/// `given_actions` replays setup actions (their effects are discarded) before
/// the action under test, which keeps multi-step workflow tests readable.
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment handed to every reduce call
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Given: the starting state
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Given: actions reduced before the action under test
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.setup.extend(actions);
        self
    }

    /// When: the action under test
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Then: assertion on the final state
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Then: assertion on the effects returned for the action under test
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the reducer and every assertion
    ///
    /// # Panics
    ///
    /// Panics if the state, action, or environment was not provided, or if
    /// an assertion fails.
    #[allow(clippy::expect_used)]
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");
        let action = self.action.expect("Action must be set with when_action()");
        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for setup in self.setup {
            let _ = self.reducer.reduce(&mut state, setup, &env);
        }

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use marquee_core::effect::Effect;

    /// Assert that nothing but `Effect::None` was returned
    ///
    /// # Panics
    ///
    /// Panics if any real effect is present.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct SeatsState {
        held: Vec<u8>,
    }

    #[derive(Clone, Debug)]
    enum SeatsAction {
        Hold(u8),
        Persist,
    }

    struct SeatsReducer;

    impl Reducer for SeatsReducer {
        type State = SeatsState;
        type Action = SeatsAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut SeatsState,
            action: SeatsAction,
            _env: &(),
        ) -> SmallVec<[Effect<SeatsAction>; 4]> {
            match action {
                SeatsAction::Hold(seat) => {
                    state.held.push(seat);
                    smallvec![Effect::None]
                },
                SeatsAction::Persist => smallvec![Effect::future(async { None })],
            }
        }
    }

    #[test]
    fn test_single_action() {
        ReducerTest::new(SeatsReducer)
            .with_env(())
            .given_state(SeatsState { held: vec![] })
            .when_action(SeatsAction::Hold(3))
            .then_state(|state| assert_eq!(state.held, vec![3]))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_setup_actions_apply_first() {
        ReducerTest::new(SeatsReducer)
            .with_env(())
            .given_state(SeatsState { held: vec![] })
            .given_actions([SeatsAction::Hold(1), SeatsAction::Hold(2)])
            .when_action(SeatsAction::Persist)
            .then_state(|state| assert_eq!(state.held, vec![1, 2]))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}
