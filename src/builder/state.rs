//! Builder for a single state's node.

use crate::builder::error::ConfigurationError;
use crate::core::{Action, EffectTemplate, Guard, PolicyFault, Reducer, State, StateNode};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for one state: its transitions, reducer and entry effect.
///
/// Duplicate transition kinds are not rejected here; they are reported
/// together with every other problem when the definition is built.
pub struct StateBuilder<S: State, A: Action, D, E> {
    state: S,
    transitions: Vec<(A::Kind, Guard<S, A, D>)>,
    reducer: Option<Reducer<A, D>>,
    effect: Option<EffectTemplate<D, E>>,
}

impl<S: State, A: Action, D: 'static, E: 'static> StateBuilder<S, A, D, E> {
    /// Start describing `state`.
    pub fn new(state: S) -> Self {
        Self {
            state,
            transitions: Vec::new(),
            reducer: None,
            effect: None,
        }
    }

    /// Add a transition fired by actions of `kind`.
    pub fn on<F>(self, kind: A::Kind, decide: F) -> Self
    where
        F: Fn(&A, &D) -> Option<S> + Send + Sync + 'static,
    {
        self.guard(kind, Guard::new(decide))
    }

    /// Add a transition whose guard may fail.
    pub fn try_on<F>(self, kind: A::Kind, decide: F) -> Self
    where
        F: Fn(&A, &D) -> Result<Option<S>, PolicyFault> + Send + Sync + 'static,
    {
        self.guard(kind, Guard::try_new(decide))
    }

    /// Add an unconditional transition to `target` on actions of `kind`.
    pub fn goto(self, kind: A::Kind, target: S) -> Self {
        self.guard(kind, Guard::to(target))
    }

    /// Add a pre-built guard.
    pub fn guard(mut self, kind: A::Kind, guard: Guard<S, A, D>) -> Self {
        self.transitions.push((kind, guard));
        self
    }

    /// Set the reducer (optional). A later call replaces an earlier one.
    pub fn reduce<F>(self, reduce: F) -> Self
    where
        F: Fn(&A, &D) -> Option<D> + Send + Sync + 'static,
    {
        self.reducer(Reducer::new(reduce))
    }

    /// Set a reducer that may fail.
    pub fn try_reduce<F>(self, reduce: F) -> Self
    where
        F: Fn(&A, &D) -> Result<Option<D>, PolicyFault> + Send + Sync + 'static,
    {
        self.reducer(Reducer::try_new(reduce))
    }

    pub fn reducer(mut self, reducer: Reducer<A, D>) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Set the effect started each time this state is entered (optional).
    pub fn on_enter<F>(mut self, create: F) -> Self
    where
        F: Fn(&D) -> E + Send + Sync + 'static,
    {
        self.effect = Some(EffectTemplate::new(create));
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Check this state, accumulating every duplicate transition kind.
    pub(crate) fn validate(&self) -> Validation<(), NonEmptyVec<ConfigurationError>> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigurationError>>> = Vec::new();

        for (kind, _) in &self.transitions {
            let check = if seen.insert(*kind) || !reported.insert(*kind) {
                Validation::success(())
            } else {
                Validation::fail(ConfigurationError::DuplicateTransition {
                    state: self.state.name().to_string(),
                    action: format!("{kind:?}"),
                })
            };
            checks.push(check);
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the node on its own, failing on duplicate transitions.
    pub fn build(self) -> Result<(S, StateNode<S, A, D, E>), ConfigurationError> {
        match self.validate() {
            Validation::Success(()) => Ok(self.into_node()),
            Validation::Failure(errors) => Err(ConfigurationError::collect(
                errors.iter().cloned().collect(),
            )),
        }
    }

    pub(crate) fn into_node(self) -> (S, StateNode<S, A, D, E>) {
        let mut node = StateNode::empty();
        for (kind, guard) in self.transitions {
            node.transitions.insert(kind, guard);
        }
        node.reducer = self.reducer;
        node.effect = self.effect;
        (self.state, node)
    }
}
