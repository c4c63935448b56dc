//! Errors that end an engine run.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Which user policy failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStage {
    Guard,
    Reducer,
}

impl fmt::Display for PolicyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guard => f.write_str("guard"),
            Self::Reducer => f.write_str("reducer"),
        }
    }
}

/// A guard or reducer failed instead of returning.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{stage} for {action} in state '{state}' failed: {message}")]
pub struct PolicyError {
    pub state: String,
    pub action: String,
    pub stage: PolicyStage,
    pub message: String,
}

/// An effect's action sequence failed.
///
/// Applications that want to recover convert their failures into ordinary
/// actions before they reach the engine; an `EffectError` always ends the
/// run.
#[derive(Debug, Clone, Error)]
#[error("effect failed: {message}")]
pub struct EffectError {
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl EffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it as the source.
    pub fn from_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for EffectError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

/// Terminal and lifecycle errors of an [`Engine`](super::Engine).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("engine is already running (run {run_id})")]
    AlreadyRunning { run_id: String },
}
