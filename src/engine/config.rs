//! Engine configuration.

use crate::builder::ConfigurationError;
use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "engine";
const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Tunables for an [`Engine`](super::Engine).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use reactive_fsm::engine::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "name": "turnstile" }"#).unwrap();
/// assert_eq!(config.name, "turnstile");
/// assert_eq!(config.history_limit, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Name recorded on the engine's tracing span
    pub name: String,

    /// Maximum number of state transitions kept in history
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Config(e.to_string()))
    }
}
