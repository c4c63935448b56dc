//! Hooks invoked at the engine's two update points.

use std::fmt::Debug;

/// Injected observer for data and state updates.
///
/// Both hooks run on the processing loop once the update is published and
/// the engine lock is released, so they may read the engine, reset it or
/// drop its [`EngineHandle`](crate::engine::EngineHandle). The next action
/// waits until they return.
pub trait EngineObserver<S, A, D>: Send + Sync {
    /// A reducer produced `next` from `previous` while handling `action`.
    fn on_data_update(&self, _action: &A, _previous: &D, _next: &D) {}

    /// `action` was handled in `state`. `next` is the state the guard
    /// published, or `None` when the machine stays, including when `state`
    /// has no guard for the action's kind.
    fn on_state_update(&self, _action: &A, _state: &S, _data: &D, _next: Option<&S>) {}
}

/// Observer that forwards both hooks to `tracing` at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl<S: Debug, A: Debug, D: Debug> EngineObserver<S, A, D> for TracingObserver {
    fn on_data_update(&self, action: &A, previous: &D, next: &D) {
        tracing::trace!(?action, ?previous, ?next, "data update");
    }

    fn on_state_update(&self, action: &A, state: &S, data: &D, next: Option<&S>) {
        tracing::trace!(?action, ?state, ?data, ?next, "state update");
    }
}

/// Observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl<S, A, D> EngineObserver<S, A, D> for SilentObserver {}
