//! State transition history.
//!
//! Immutable record of the guard-driven state changes an engine run has
//! made, newest last.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use reactive_fsm::core::{State, StateTransition};
/// use serde::{Deserialize, Serialize};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Gate {
///     Locked,
///     Unlocked,
/// }
///
/// impl State for Gate {
///     fn name(&self) -> &str {
///         match self {
///             Self::Locked => "Locked",
///             Self::Unlocked => "Unlocked",
///         }
///     }
/// }
///
/// let transition = StateTransition {
///     from: Gate::Locked,
///     to: Gate::Unlocked,
///     timestamp: Utc::now(),
///     occupancy: 1,
/// };
/// assert!(!transition.is_reentry());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being left
    pub from: S,
    /// The state being entered
    pub to: S,
    /// When the new state was published
    pub timestamp: DateTime<Utc>,
    /// Sequence number of the occupancy that `to` begins
    pub occupancy: u64,
}

impl<S: State> StateTransition<S> {
    /// A value-equal state was published again. It still counts as leaving
    /// and re-entering.
    pub fn is_reentry(&self) -> bool {
        self.from == self.to
    }
}

/// Ordered history of state transitions.
///
/// `record` returns a new history and leaves the receiver untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Record a transition keeping at most `limit` entries, oldest dropped
    /// first. A `limit` of zero keeps nothing.
    pub fn record_bounded(&self, transition: StateTransition<S>, limit: usize) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        let excess = transitions.len().saturating_sub(limit);
        transitions.drain(..excess);
        Self { transitions }
    }

    /// The path of states traversed: the first `from`, then every `to`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reactive_fsm::core::{State, StateHistory, StateTransition};
    /// use serde::{Deserialize, Serialize};
    /// use chrono::Utc;
    ///
    /// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    /// enum Phase { Idle, Busy }
    ///
    /// impl State for Phase {
    ///     fn name(&self) -> &str {
    ///         match self {
    ///             Self::Idle => "Idle",
    ///             Self::Busy => "Busy",
    ///         }
    ///     }
    /// }
    ///
    /// let history = StateHistory::new()
    ///     .record(StateTransition {
    ///         from: Phase::Idle,
    ///         to: Phase::Busy,
    ///         timestamp: Utc::now(),
    ///         occupancy: 1,
    ///     })
    ///     .record(StateTransition {
    ///         from: Phase::Busy,
    ///         to: Phase::Idle,
    ///         timestamp: Utc::now(),
    ///         occupancy: 2,
    ///     });
    ///
    /// assert_eq!(history.get_path(), vec![&Phase::Idle, &Phase::Busy, &Phase::Idle]);
    /// ```
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
