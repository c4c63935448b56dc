//! The application side of an engine: its types and its effect executor.

use super::error::EffectError;
use crate::core::{Action, Definition, State};
use futures::stream::BoxStream;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Asynchronous sequence of actions produced by one effect execution.
pub type ActionStream<A> = BoxStream<'static, Result<A, EffectError>>;

/// Definition type for a given [`Machine`].
pub type MachineDefinition<M> = Definition<
    <M as Machine>::State,
    <M as Machine>::Action,
    <M as Machine>::Data,
    <M as Machine>::Effect,
>;

/// Bundles an application's state, action, data and effect types with the
/// function that executes its effects.
///
/// `execute` maps a descriptor to a stream of actions. The engine drops the
/// stream and cancels `cancel` as soon as the state that started the effect
/// is left; implementations that spawn work of their own should stop when
/// the token fires. Cancellation is cleanup, never an error.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use reactive_fsm::engine::{ActionStream, Machine};
/// use reactive_fsm::{action_enum, state_enum};
/// use tokio_util::sync::CancellationToken;
///
/// state_enum! {
///     enum Phase {
///         Idle,
///         Loading,
///     }
/// }
///
/// action_enum! {
///     enum Event {
///         Load,
///         Loaded(u32),
///     }
///     kind: EventKind
/// }
///
/// #[derive(Debug)]
/// enum Fetch {
///     Page(u32),
/// }
///
/// struct Pager;
///
/// impl Machine for Pager {
///     type State = Phase;
///     type Action = Event;
///     type Data = u32;
///     type Effect = Fetch;
///
///     fn execute(&self, effect: Fetch, _cancel: CancellationToken) -> ActionStream<Event> {
///         match effect {
///             Fetch::Page(page) => futures::stream::once(async move { Ok(Event::Loaded(page)) }).boxed(),
///         }
///     }
/// }
/// ```
pub trait Machine: Send + Sync + 'static {
    type State: State;
    type Action: Action;
    type Data: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Effect: Debug + Send + 'static;

    /// Run `effect`, producing the actions it emits.
    fn execute(&self, effect: Self::Effect, cancel: CancellationToken) -> ActionStream<Self::Action>;
}
