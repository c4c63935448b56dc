//! State trait for the modes an engine can occupy.
//!
//! A state value names the current mode of the machine. The behaviour bound
//! to a mode (its transitions, reducer and entry effect) lives in a
//! [`StateNode`](super::StateNode) looked up by the state's variant.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::mem::Discriminant;

/// Trait for state machine states.
///
/// States are immutable values. Two states of the same enum variant share
/// one node in a [`Definition`](super::Definition), so a variant carrying a
/// payload still resolves to a single transition table.
///
/// # Example
///
/// ```rust
/// use reactive_fsm::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum TurnstileState {
///     Locked,
///     Unlocked,
/// }
///
/// impl State for TurnstileState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Locked => "Locked",
///             Self::Unlocked => "Unlocked",
///         }
///     }
/// }
///
/// assert_eq!(TurnstileState::Locked.name(), "Locked");
/// assert_eq!(
///     TurnstileState::Locked.variant(),
///     TurnstileState::Locked.variant()
/// );
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// The engine does not stop in a final state; this is informational and
    /// used by applications and logs. Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }

    /// The variant key used to find this state's node in a definition.
    fn variant(&self) -> Discriminant<Self> {
        std::mem::discriminant(self)
    }
}
