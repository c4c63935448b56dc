//! Builder API for ergonomic definition and engine construction.
//!
//! This module provides fluent builders and macros for declaring state
//! graphs with minimal boilerplate. Every problem in a definition is
//! reported at build time, before an engine can run.

pub mod definition;
pub mod engine;
pub mod error;
pub mod macros;
pub mod state;

pub use definition::DefinitionBuilder;
pub use engine::EngineBuilder;
pub use error::ConfigurationError;
pub use state::StateBuilder;

use crate::core::Guard;

/// Create a guard that moves to `target` when `predicate` holds and stays
/// put otherwise.
///
/// # Example
///
/// ```
/// use reactive_fsm::builder::guarded;
/// use reactive_fsm::state_enum;
///
/// state_enum! {
///     enum Tank {
///         Filling,
///         Full,
///     }
/// }
///
/// let guard = guarded::<_, (), u32, _>(Tank::Full, |_, level| *level >= 100);
///
/// assert_eq!(guard.decide(&(), &100), Ok(Some(Tank::Full)));
/// assert_eq!(guard.decide(&(), &40), Ok(None));
/// ```
pub fn guarded<S, A, D, F>(target: S, predicate: F) -> Guard<S, A, D>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(&A, &D) -> bool + Send + Sync + 'static,
{
    Guard::new(move |action, data| predicate(action, data).then(|| target.clone()))
}
