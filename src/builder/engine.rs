//! Builder for constructing engines.

use crate::builder::error::ConfigurationError;
use crate::core::State;
use crate::engine::{
    Engine, EngineConfig, EngineObserver, EngineParts, Machine, MachineDefinition,
    TracingObserver,
};
use tokio::runtime::Handle;

/// Builder for an [`Engine`] with a fluent API.
///
/// The definition, initial state and initial data are required. The runtime
/// defaults to the one `build` is called from, the observer to
/// [`TracingObserver`].
pub struct EngineBuilder<M: Machine> {
    machine: M,
    definition: Option<MachineDefinition<M>>,
    initial_state: Option<M::State>,
    initial_data: Option<M::Data>,
    runtime: Option<Handle>,
    observer: Option<Box<dyn EngineObserver<M::State, M::Action, M::Data>>>,
    config: EngineConfig,
}

impl<M: Machine> EngineBuilder<M> {
    /// Create a new builder around `machine`.
    pub fn new(machine: M) -> Self {
        Self {
            machine,
            definition: None,
            initial_state: None,
            initial_data: None,
            runtime: None,
            observer: None,
            config: EngineConfig::default(),
        }
    }

    /// Set the state graph (required).
    pub fn definition(mut self, definition: MachineDefinition<M>) -> Self {
        self.definition = Some(definition);
        self
    }

    /// Set the initial state (required). Must be declared in the definition.
    pub fn initial_state(mut self, state: M::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the initial data (required).
    pub fn initial_data(mut self, data: M::Data) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Set the runtime the engine spawns its tasks on.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: EngineObserver<M::State, M::Action, M::Data> + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    /// Returns an error if required fields are missing or the initial state
    /// is not part of the definition.
    pub fn build(self) -> Result<Engine<M>, ConfigurationError> {
        let definition = self.definition.ok_or(ConfigurationError::MissingDefinition)?;
        let initial_state = self
            .initial_state
            .ok_or(ConfigurationError::MissingInitialState)?;
        let initial_data = self
            .initial_data
            .ok_or(ConfigurationError::MissingInitialData)?;

        if !definition.is_declared(&initial_state) {
            return Err(ConfigurationError::UndefinedInitialState {
                state: initial_state.name().to_string(),
            });
        }

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| ConfigurationError::MissingRuntime)?,
        };

        let observer = self
            .observer
            .unwrap_or_else(|| Box::new(TracingObserver));

        Ok(Engine::from_parts(EngineParts {
            machine: self.machine,
            definition,
            initial_state,
            initial_data,
            runtime,
            observer,
            config: self.config,
        }))
    }
}
