//! Builder for a complete state graph.

use crate::builder::error::ConfigurationError;
use crate::builder::state::StateBuilder;
use crate::core::{Action, Definition, State};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for a [`Definition`] with a fluent API.
///
/// `build` validates every state and reports all problems at once.
///
/// # Example
///
/// ```rust
/// use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
/// use reactive_fsm::{action_enum, state_enum};
///
/// state_enum! {
///     enum Gate {
///         Locked,
///         Unlocked,
///     }
/// }
///
/// action_enum! {
///     enum GateAction {
///         Coin,
///         Push,
///     }
///     kind: GateActionKind
/// }
///
/// let definition = DefinitionBuilder::<Gate, GateAction, u32, ()>::new()
///     .state(StateBuilder::new(Gate::Locked).goto(GateActionKind::Coin, Gate::Unlocked))
///     .state(
///         StateBuilder::new(Gate::Unlocked)
///             .goto(GateActionKind::Push, Gate::Locked)
///             .reduce(|_, turns: &u32| Some(turns + 1)),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.len(), 2);
/// ```
pub struct DefinitionBuilder<S: State, A: Action, D, E> {
    states: Vec<StateBuilder<S, A, D, E>>,
}

impl<S: State, A: Action, D: 'static, E: 'static> DefinitionBuilder<S, A, D, E> {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Add a state.
    pub fn state(mut self, builder: StateBuilder<S, A, D, E>) -> Self {
        self.states.push(builder);
        self
    }

    /// Add several states at once.
    pub fn states(mut self, builders: Vec<StateBuilder<S, A, D, E>>) -> Self {
        self.states.extend(builders);
        self
    }

    /// Build the definition.
    /// Returns every duplicate state and duplicate transition found.
    pub fn build(self) -> Result<Definition<S, A, D, E>, ConfigurationError> {
        if self.states.is_empty() {
            return Err(ConfigurationError::NoStates);
        }

        let mut seen = HashSet::new();
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigurationError>>> = Vec::new();

        for builder in &self.states {
            if !seen.insert(builder.state().variant()) {
                checks.push(Validation::fail(ConfigurationError::DuplicateState {
                    state: builder.state().name().to_string(),
                }));
            }
            checks.push(builder.validate());
        }

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(Definition::from_nodes(
                self.states
                    .into_iter()
                    .map(StateBuilder::into_node)
                    .collect(),
            )),
            Validation::Failure(errors) => Err(ConfigurationError::collect(
                errors.iter().cloned().collect(),
            )),
        }
    }
}

impl<S: State, A: Action, D: 'static, E: 'static> Default for DefinitionBuilder<S, A, D, E> {
    fn default() -> Self {
        Self::new()
    }
}
