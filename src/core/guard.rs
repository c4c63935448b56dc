//! Guard functions that choose the next state.
//!
//! A guard is the transition itself: given the action that fired it and
//! the current data, it names the next state, or `None` to stay put.

use super::fault::{self, PolicyFault};
use std::fmt;
use std::sync::Arc;

type DecideFn<S, A, D> = dyn Fn(&A, &D) -> Result<Option<S>, PolicyFault> + Send + Sync;

/// Pure decision function `(Action, Data) -> Option<State>`.
///
/// Returning the current state again is a real state change: the running
/// effect is cancelled and the state's effect starts anew.
///
/// # Example
///
/// ```rust
/// use reactive_fsm::core::Guard;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// // Only close when nobody is standing in the doorway.
/// let close = Guard::new(|_action: &(), people: &u32| (*people == 0).then_some(Door::Closed));
///
/// assert_eq!(close.decide(&(), &0), Ok(Some(Door::Closed)));
/// assert_eq!(close.decide(&(), &2), Ok(None));
///
/// let open = Guard::<Door, (), u32>::to(Door::Open);
/// assert_eq!(open.decide(&(), &5), Ok(Some(Door::Open)));
/// ```
pub struct Guard<S, A, D> {
    decide: Arc<DecideFn<S, A, D>>,
}

impl<S, A, D> Guard<S, A, D> {
    /// Create a guard from an infallible decision function.
    pub fn new<F>(decide: F) -> Self
    where
        F: Fn(&A, &D) -> Option<S> + Send + Sync + 'static,
    {
        Self {
            decide: Arc::new(move |action, data| Ok(decide(action, data))),
        }
    }

    /// Create a guard from a decision function that may fail.
    ///
    /// A returned [`PolicyFault`] terminates the engine run.
    pub fn try_new<F>(decide: F) -> Self
    where
        F: Fn(&A, &D) -> Result<Option<S>, PolicyFault> + Send + Sync + 'static,
    {
        Self {
            decide: Arc::new(decide),
        }
    }

    /// Guard that always moves to `state`.
    pub fn to(state: S) -> Self
    where
        S: Clone + Send + Sync + 'static,
    {
        Self::new(move |_, _| Some(state.clone()))
    }

    /// Evaluate the guard. Panics inside the decision function are reported
    /// as a [`PolicyFault`].
    pub fn decide(&self, action: &A, data: &D) -> Result<Option<S>, PolicyFault> {
        fault::contain(|| (self.decide)(action, data))
    }
}

impl<S, A, D> Clone for Guard<S, A, D> {
    fn clone(&self) -> Self {
        Self {
            decide: Arc::clone(&self.decide),
        }
    }
}

impl<S, A, D> fmt::Debug for Guard<S, A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
