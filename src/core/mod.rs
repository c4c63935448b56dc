//! Definition model: the immutable description of a state graph.
//!
//! This module contains the pure part of the engine:
//! - `State` and `Action` traits for the application's sum types
//! - `Guard` and `Reducer` policies evaluated per action
//! - `EffectTemplate` describing what to run while a state is occupied
//! - `Definition`, the per-state lookup the engine drives
//! - Immutable history of state changes
//!
//! Nothing in this module performs I/O or spawns work.

mod action;
mod definition;
mod fault;
mod guard;
mod history;
mod reducer;
mod state;

pub use action::Action;
pub use definition::{Definition, StateNode, Transitions};
pub use fault::PolicyFault;
pub(crate) use fault::{contain, panic_message};
pub use guard::Guard;
pub use history::{StateHistory, StateTransition};
pub use reducer::{EffectTemplate, Reducer};
pub use state::State;
