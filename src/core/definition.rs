//! The declarative state graph: per-state transition tables, reducers and
//! entry effects.
//!
//! Values here are immutable once built. Construction and validation live
//! in [`crate::builder`].

use super::action::Action;
use super::guard::Guard;
use super::reducer::{EffectTemplate, Reducer};
use super::state::State;
use std::collections::HashMap;
use std::fmt;
use std::mem::Discriminant;
use std::sync::Arc;

/// Map from action kind to the guard it fires. At most one guard per kind.
pub struct Transitions<S, A: Action, D> {
    guards: HashMap<A::Kind, Guard<S, A, D>>,
}

impl<S, A: Action, D> Transitions<S, A, D> {
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
        }
    }

    /// Insert a guard for `kind`. A kind that is already present keeps its
    /// guard and the call returns `false`.
    pub fn insert(&mut self, kind: A::Kind, guard: Guard<S, A, D>) -> bool {
        match self.guards.entry(kind) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(guard);
                true
            }
        }
    }

    /// Look up the guard for an action, by its kind.
    pub fn guard_for(&self, action: &A) -> Option<&Guard<S, A, D>> {
        self.guards.get(&action.kind())
    }

    pub fn handles(&self, kind: A::Kind) -> bool {
        self.guards.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &A::Kind> {
        self.guards.keys()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl<S, A: Action, D> Default for Transitions<S, A, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A: Action, D> Clone for Transitions<S, A, D> {
    fn clone(&self) -> Self {
        Self {
            guards: self.guards.clone(),
        }
    }
}

impl<S, A: Action, D> fmt::Debug for Transitions<S, A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.guards.keys()).finish()
    }
}

/// Everything bound to one state: its transitions, optional reducer and
/// optional entry effect.
pub struct StateNode<S, A: Action, D, E> {
    pub(crate) transitions: Transitions<S, A, D>,
    pub(crate) reducer: Option<Reducer<A, D>>,
    pub(crate) effect: Option<EffectTemplate<D, E>>,
}

impl<S, A: Action, D, E> StateNode<S, A, D, E> {
    /// A node with no transitions, reducer or effect. The engine treats an
    /// undeclared state this way.
    pub fn empty() -> Self {
        Self {
            transitions: Transitions::new(),
            reducer: None,
            effect: None,
        }
    }

    pub fn transitions(&self) -> &Transitions<S, A, D> {
        &self.transitions
    }

    pub fn reducer(&self) -> Option<&Reducer<A, D>> {
        self.reducer.as_ref()
    }

    pub fn effect(&self) -> Option<&EffectTemplate<D, E>> {
        self.effect.as_ref()
    }
}

impl<S, A: Action, D, E> fmt::Debug for StateNode<S, A, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("transitions", &self.transitions)
            .field("reducer", &self.reducer.is_some())
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

/// Immutable state graph shared by an engine.
///
/// Nodes are keyed by state variant. Cloning is cheap.
pub struct Definition<S: State, A: Action, D, E> {
    nodes: Arc<HashMap<Discriminant<S>, StateNode<S, A, D, E>>>,
    names: Arc<Vec<String>>,
    empty: Arc<StateNode<S, A, D, E>>,
}

impl<S: State, A: Action, D, E> Definition<S, A, D, E> {
    pub(crate) fn from_nodes(nodes: Vec<(S, StateNode<S, A, D, E>)>) -> Self {
        let names = nodes.iter().map(|(state, _)| state.name().to_string()).collect();
        let nodes = nodes
            .into_iter()
            .map(|(state, node)| (state.variant(), node))
            .collect();

        Self {
            nodes: Arc::new(nodes),
            names: Arc::new(names),
            empty: Arc::new(StateNode::empty()),
        }
    }

    /// The node for `state`, or an empty node when the state was never
    /// declared.
    pub fn node(&self, state: &S) -> &StateNode<S, A, D, E> {
        self.nodes.get(&state.variant()).unwrap_or(&self.empty)
    }

    pub fn is_declared(&self, state: &S) -> bool {
        self.nodes.contains_key(&state.variant())
    }

    /// Names of the declared states, in declaration order.
    pub fn state_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<S: State, A: Action, D, E> Clone for Definition<S, A, D, E> {
    fn clone(&self) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
            names: Arc::clone(&self.names),
            empty: Arc::clone(&self.empty),
        }
    }
}

impl<S: State, A: Action, D, E> fmt::Debug for Definition<S, A, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("states", &self.names)
            .finish()
    }
}
