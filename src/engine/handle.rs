//! Lifecycle handle of one engine run.

use super::error::EngineError;
use super::machine::Machine;
use super::Shared;
use crate::stream::ObserverLease;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Identifier of one engine run, as recorded on its tracing span.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct RunId(Arc<Uuid>);

impl RunId {
    pub fn generate() -> Self {
        Self(Arc::new(Uuid::new_v4()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunId({})", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keeps an engine run alive.
///
/// The handle counts as an observer of both output streams. Dropping it,
/// or calling [`dispose`](Self::dispose), cancels the running effect, stops
/// the processing loop and republishes the initial data and state.
pub struct EngineHandle<M: Machine> {
    run_id: RunId,
    shared: Arc<Shared<M>>,
    join: Option<JoinHandle<Result<(), EngineError>>>,
    _state_lease: ObserverLease<M::State, EngineError>,
    _data_lease: ObserverLease<M::Data, EngineError>,
}

impl<M: Machine> EngineHandle<M> {
    pub(crate) fn new(
        run_id: RunId,
        shared: Arc<Shared<M>>,
        join: JoinHandle<Result<(), EngineError>>,
    ) -> Self {
        let _state_lease = shared.states.lease();
        let _data_lease = shared.data.lease();
        Self {
            run_id,
            shared,
            join: Some(join),
            _state_lease,
            _data_lease,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Whether this run is still processing actions.
    pub fn is_active(&self) -> bool {
        self.shared.is_current_run(&self.run_id)
    }

    /// Tear the run down. Equivalent to dropping the handle.
    pub fn dispose(self) {
        drop(self);
    }

    /// Wait until the run ends on its own, which only happens through a
    /// terminal error. Returns `Ok` if the processing loop was stopped
    /// without one.
    pub async fn join(mut self) -> Result<(), EngineError> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        match join.await {
            Ok(outcome) => outcome,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(_) => Ok(()),
        }
    }
}

impl<M: Machine> Drop for EngineHandle<M> {
    fn drop(&mut self) {
        self.shared.teardown(&self.run_id);
    }
}

impl<M: Machine> fmt::Debug for EngineHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("run_id", &self.run_id)
            .field("active", &self.is_active())
            .finish()
    }
}
