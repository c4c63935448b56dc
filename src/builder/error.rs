//! Construction errors for definitions and engines.

use thiserror::Error;

/// A definition or engine could not be built. Detected before any engine
/// run can start.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("State '{state}' declares more than one transition for action {action}")]
    DuplicateTransition { state: String, action: String },

    #[error("State '{state}' is declared more than once")]
    DuplicateState { state: String },

    #[error("No states defined. Add at least one state with .state(..)")]
    NoStates,

    #[error("Initial state '{state}' is not declared in the definition")]
    UndefinedInitialState { state: String },

    #[error("Definition not specified. Call .definition(definition) before .build()")]
    MissingDefinition,

    #[error("Initial state not specified. Call .initial_state(state) before .build()")]
    MissingInitialState,

    #[error("Initial data not specified. Call .initial_data(data) before .build()")]
    MissingInitialData,

    #[error("No tokio runtime available. Call .runtime(handle) or build inside a runtime")]
    MissingRuntime,

    #[error("Invalid engine config: {0}")]
    Config(String),

    #[error("{} configuration errors: {}", .0.len(), join(.0))]
    Invalid(Vec<ConfigurationError>),
}

fn join(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigurationError {
    /// Collapse accumulated errors: one stays as itself, several become
    /// [`ConfigurationError::Invalid`].
    pub(crate) fn collect(mut errors: Vec<ConfigurationError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Invalid(errors)
        }
    }

    /// The individual problems, flattening [`ConfigurationError::Invalid`].
    pub fn problems(&self) -> Vec<&ConfigurationError> {
        match self {
            Self::Invalid(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_error_is_not_wrapped() {
        let error = ConfigurationError::collect(vec![ConfigurationError::NoStates]);
        assert_eq!(error, ConfigurationError::NoStates);
        assert_eq!(error.problems().len(), 1);
    }

    #[test]
    fn several_errors_are_listed() {
        let error = ConfigurationError::collect(vec![
            ConfigurationError::DuplicateState {
                state: "Locked".to_string(),
            },
            ConfigurationError::DuplicateTransition {
                state: "Unlocked".to_string(),
                action: "Turn".to_string(),
            },
        ]);

        assert_eq!(error.problems().len(), 2);
        let message = error.to_string();
        assert!(message.starts_with("2 configuration errors"));
        assert!(message.contains("'Locked' is declared more than once"));
        assert!(message.contains("action Turn"));
    }
}
