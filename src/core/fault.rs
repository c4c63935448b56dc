//! Failure raised by a guard or reducer.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// A guard or reducer refused to produce an answer.
///
/// Guards and reducers are expected to be total. A fallible closure returns
/// this instead; a panicking closure is converted into one. Either way the
/// engine run ends with a [`PolicyError`](crate::engine::PolicyError).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PolicyFault {
    message: String,
}

impl PolicyFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self {
            message: panic_message(payload),
        }
    }
}

/// Describe a caught panic payload as `panicked: <text>`.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("panicked: {text}")
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("panicked: {text}")
    } else {
        "panicked".to_string()
    }
}

/// Run a user policy closure, turning a panic into a [`PolicyFault`].
pub(crate) fn contain<T>(
    policy: impl FnOnce() -> Result<T, PolicyFault>,
) -> Result<T, PolicyFault> {
    panic::catch_unwind(AssertUnwindSafe(policy)).unwrap_or_else(|payload| {
        Err(PolicyFault::from_panic(payload))
    })
}
