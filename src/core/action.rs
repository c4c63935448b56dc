//! Action trait for the discrete events an engine consumes.

use std::fmt::Debug;
use std::hash::Hash;

/// A discrete input event, produced by the caller's action source or by an
/// effect.
///
/// Transition tables are keyed by [`Kind`](Action::Kind), a fieldless enum
/// mirroring the action's variants. Matching on the kind in
/// [`kind`](Action::kind) keeps the dispatch table exhaustive: adding an
/// action variant without a kind fails to compile.
///
/// Use [`action_enum!`](crate::action_enum) to generate both enums.
///
/// # Example
///
/// ```rust
/// use reactive_fsm::core::Action;
///
/// #[derive(Clone, Debug)]
/// enum CounterAction {
///     Add(i64),
///     Clear,
/// }
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum CounterActionKind {
///     Add,
///     Clear,
/// }
///
/// impl Action for CounterAction {
///     type Kind = CounterActionKind;
///
///     fn kind(&self) -> Self::Kind {
///         match self {
///             Self::Add(_) => CounterActionKind::Add,
///             Self::Clear => CounterActionKind::Clear,
///         }
///     }
/// }
///
/// assert_eq!(CounterAction::Add(3).kind(), CounterActionKind::Add);
/// ```
pub trait Action: Clone + Debug + Send + Sync + 'static {
    /// Payload-free discriminant of the action.
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// The kind this action dispatches on.
    fn kind(&self) -> Self::Kind;
}
