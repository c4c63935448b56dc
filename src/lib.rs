//! Reactive FSM: a reactive finite-state-machine engine
//!
//! A state machine is declared once as an immutable [`Definition`]: per state,
//! the guards that pick the next state for each kind of action, an optional
//! reducer that updates the machine's data, and an optional effect that runs
//! for as long as the state is occupied. An [`Engine`](engine::Engine) then
//! drives that definition over a stream of actions and publishes the
//! resulting state and data on replay-latest streams.
//!
//! # Core Concepts
//!
//! - **State** and **Action**: the application's sum types, see the
//!   [`state_enum!`] and [`action_enum!`] macros
//! - **Guard**: `(Action, Data) -> Option<State>`, the transition itself
//! - **Reducer**: `(Action, Data) -> Option<Data>`, evaluated before the guard
//! - **Effect**: asynchronous work producing more actions, cancelled on exit
//! - **History**: immutable record of the state changes of a run
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
//! use reactive_fsm::engine::{ActionStream, Engine, Machine};
//! use reactive_fsm::{action_enum, state_enum};
//! use tokio_util::sync::CancellationToken;
//!
//! state_enum! {
//!     enum Phase {
//!         Idle,
//!         Busy,
//!     }
//! }
//!
//! action_enum! {
//!     enum Command {
//!         Increment,
//!         Done(u32),
//!     }
//!     kind: CommandKind
//! }
//!
//! #[derive(Debug)]
//! struct Work(u32);
//!
//! struct Counter;
//!
//! impl Machine for Counter {
//!     type State = Phase;
//!     type Action = Command;
//!     type Data = u32;
//!     type Effect = Work;
//!
//!     fn execute(&self, work: Work, _: CancellationToken) -> ActionStream<Command> {
//!         futures::stream::once(async move { Ok(Command::Done(work.0 + 1)) }).boxed()
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let definition = DefinitionBuilder::<Phase, Command, u32, Work>::new()
//!     .state(StateBuilder::new(Phase::Idle).goto(CommandKind::Increment, Phase::Busy))
//!     .state(
//!         StateBuilder::new(Phase::Busy)
//!             .on_enter(|count: &u32| Work(*count))
//!             .reduce(|action: &Command, _: &u32| match action {
//!                 Command::Done(count) => Some(*count),
//!                 _ => None,
//!             })
//!             .goto(CommandKind::Done, Phase::Idle),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let engine = Engine::builder(Counter)
//!     .definition(definition)
//!     .initial_state(Phase::Idle)
//!     .initial_data(0)
//!     .build()
//!     .unwrap();
//!
//! let mut data = engine.data_stream();
//! let _run = engine.start(futures::stream::iter(vec![Command::Increment])).unwrap();
//!
//! assert_eq!(data.next().await, Some(Ok(0)));
//! assert_eq!(data.next().await, Some(Ok(1)));
//! assert_eq!(engine.current_state(), Phase::Idle);
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod stream;

// Re-export commonly used types
pub use builder::{ConfigurationError, DefinitionBuilder, EngineBuilder, StateBuilder};
pub use core::{Action, Definition, Guard, Reducer, State, StateHistory, StateTransition};
pub use engine::{Engine, EngineError, EngineHandle, Machine};
