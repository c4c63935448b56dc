//! The reactive engine that drives one live state machine instance.
//!
//! # Key Concepts
//!
//! - **Occupancy**: one continuous stay in a state, from its publication to
//!   the next state publication (a value-equal state included). The entry
//!   effect of the state runs for exactly as long as its occupancy.
//! - **Merged feed**: caller actions and effect actions share one queue;
//!   the processing loop handles them one at a time.
//! - **Output streams**: state and data are published on replay-latest
//!   [`Broadcast`](crate::stream::Broadcast) streams.
//!
//! # Processing one action
//!
//! 1. The current state's reducer computes new data from the current data.
//! 2. The guard registered for the action's kind picks the next state,
//!    seeing the reduced data.
//! 3. The new data is published, then the new state. Publishing a state
//!    cancels the current effect and starts the new state's effect.
//!
//! A failing guard, reducer or effect ends the run: the error is delivered
//! on both streams and nothing of the failing action is applied.

mod config;
mod error;
mod feed;
mod handle;
mod machine;
mod observer;

pub use config::EngineConfig;
pub use error::{EffectError, EngineError, PolicyError, PolicyStage};
pub use handle::{EngineHandle, RunId};
pub use machine::{ActionStream, Machine, MachineDefinition};
pub use observer::{EngineObserver, SilentObserver, TracingObserver};

use crate::builder::EngineBuilder;
use crate::core::{contain, Action, PolicyFault, State, StateHistory, StateTransition};
use crate::stream::{Broadcast, Subscription};
use chrono::Utc;
use feed::{forward_effect, forward_source, Feed};
use futures::Stream;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Subscription to an engine's state stream.
pub type StateStream<M> = Subscription<<M as Machine>::State, EngineError>;

/// Subscription to an engine's data stream.
pub type DataStream<M> = Subscription<<M as Machine>::Data, EngineError>;

type Observer<M> =
    Box<dyn EngineObserver<<M as Machine>::State, <M as Machine>::Action, <M as Machine>::Data>>;

/// Everything an engine is constructed from. Assembled by [`EngineBuilder`].
pub(crate) struct EngineParts<M: Machine> {
    pub(crate) machine: M,
    pub(crate) definition: MachineDefinition<M>,
    pub(crate) initial_state: M::State,
    pub(crate) initial_data: M::Data,
    pub(crate) runtime: Handle,
    pub(crate) observer: Observer<M>,
    pub(crate) config: EngineConfig,
}

/// A live run: the queue feeding the loop and the tokens cancelling it.
struct Run<A> {
    id: RunId,
    feed: UnboundedSender<Feed<A>>,
    stop: CancellationToken,
    effect: Option<CancellationToken>,
    span: tracing::Span,
}

/// An update of one action, reported to the observer after the lock is
/// released.
enum Notice<M: Machine> {
    Data {
        previous: M::Data,
        next: M::Data,
    },
    State {
        state: M::State,
        data: M::Data,
        next: Option<M::State>,
    },
}

/// Engine-private current values. Written only under the engine lock.
struct Core<M: Machine> {
    state: M::State,
    data: M::Data,
    occupancy: u64,
    history: StateHistory<M::State>,
    run: Option<Run<M::Action>>,
}

pub(crate) struct Shared<M: Machine> {
    machine: M,
    definition: MachineDefinition<M>,
    initial_state: M::State,
    initial_data: M::Data,
    runtime: Handle,
    observer: Observer<M>,
    config: EngineConfig,
    pub(crate) states: Broadcast<M::State, EngineError>,
    pub(crate) data: Broadcast<M::Data, EngineError>,
    core: Mutex<Core<M>>,
}

/// Drives a [`Machine`] over its definition.
///
/// Cloning yields another handle to the same engine.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
/// use reactive_fsm::engine::{ActionStream, Engine, Machine};
/// use reactive_fsm::{action_enum, state_enum};
/// use std::convert::Infallible;
/// use tokio_util::sync::CancellationToken;
///
/// state_enum! {
///     enum Gate {
///         Locked,
///         Unlocked,
///     }
/// }
///
/// action_enum! {
///     enum GateAction {
///         Coin,
///         Push,
///     }
///     kind: GateActionKind
/// }
///
/// struct Turnstile;
///
/// impl Machine for Turnstile {
///     type State = Gate;
///     type Action = GateAction;
///     type Data = u32;
///     type Effect = Infallible;
///
///     fn execute(&self, effect: Infallible, _: CancellationToken) -> ActionStream<GateAction> {
///         match effect {}
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let definition = DefinitionBuilder::<Gate, GateAction, u32, Infallible>::new()
///     .state(StateBuilder::new(Gate::Locked).goto(GateActionKind::Coin, Gate::Unlocked))
///     .state(
///         StateBuilder::new(Gate::Unlocked)
///             .goto(GateActionKind::Push, Gate::Locked)
///             .reduce(|_, turns: &u32| Some(turns + 1)),
///     )
///     .build()
///     .unwrap();
///
/// let engine = Engine::builder(Turnstile)
///     .definition(definition)
///     .initial_state(Gate::Locked)
///     .initial_data(0)
///     .build()
///     .unwrap();
///
/// let mut states = engine.state_stream();
/// let actions = futures::stream::iter(vec![GateAction::Coin, GateAction::Push]);
/// let _run = engine.start(actions).unwrap();
///
/// assert_eq!(states.next().await, Some(Ok(Gate::Locked)));
/// assert_eq!(states.next().await, Some(Ok(Gate::Unlocked)));
/// assert_eq!(states.next().await, Some(Ok(Gate::Locked)));
/// assert_eq!(engine.current_data(), 1);
/// # }
/// ```
pub struct Engine<M: Machine> {
    shared: Arc<Shared<M>>,
}

impl<M: Machine> Engine<M> {
    /// Start building an engine for `machine`.
    pub fn builder(machine: M) -> EngineBuilder<M> {
        EngineBuilder::new(machine)
    }

    pub(crate) fn from_parts(parts: EngineParts<M>) -> Self {
        let EngineParts {
            machine,
            definition,
            initial_state,
            initial_data,
            runtime,
            observer,
            config,
        } = parts;

        let core = Core {
            state: initial_state.clone(),
            data: initial_data.clone(),
            occupancy: 0,
            history: StateHistory::new(),
            run: None,
        };

        Self {
            shared: Arc::new(Shared {
                states: Broadcast::new(initial_state.clone()),
                data: Broadcast::new(initial_data.clone()),
                machine,
                definition,
                initial_state,
                initial_data,
                runtime,
                observer,
                config,
                core: Mutex::new(core),
            }),
        }
    }

    /// Bind `source` and begin processing.
    ///
    /// The run lasts until the returned handle is dropped or a guard,
    /// reducer or effect fails. Starting after a failure clears the error
    /// and begins again from the initial state and data.
    pub fn start<St>(&self, source: St) -> Result<EngineHandle<M>, EngineError>
    where
        St: Stream<Item = M::Action> + Send + 'static,
    {
        Shared::start(&self.shared, source)
    }

    /// Republish the initial data and state, cancelling the running effect.
    ///
    /// Has no effect once the engine has failed; call [`start`](Self::start)
    /// again instead.
    pub fn reset(&self) {
        self.shared.reset();
    }

    /// Subscribe to state changes. The current state is replayed first.
    pub fn state_stream(&self) -> StateStream<M> {
        self.shared.states.subscribe()
    }

    /// Subscribe to data changes. The current data is replayed first.
    pub fn data_stream(&self) -> DataStream<M> {
        self.shared.data.subscribe()
    }

    pub fn current_state(&self) -> M::State {
        self.shared.lock().state.clone()
    }

    pub fn current_data(&self) -> M::Data {
        self.shared.lock().data.clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().run.is_some()
    }

    /// Transitions recorded since the current (or last) run began.
    pub fn history(&self) -> StateHistory<M::State> {
        self.shared.lock().history.clone()
    }

    /// The error that ended the last run, if it has not been restarted.
    pub fn terminal_error(&self) -> Option<EngineError> {
        self.shared.states.terminal_error()
    }

    /// Observers attached to the state stream, a live run included.
    pub fn observer_count(&self) -> usize {
        self.shared.states.observer_count()
    }

    pub fn definition(&self) -> &MachineDefinition<M> {
        &self.shared.definition
    }

    pub fn machine(&self) -> &M {
        &self.shared.machine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }
}

impl<M: Machine> Clone for Engine<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M: Machine> Shared<M> {
    fn lock(&self) -> MutexGuard<'_, Core<M>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_current_run(&self, run_id: &RunId) -> bool {
        self.lock().run.as_ref().is_some_and(|run| run.id == *run_id)
    }

    fn start<St>(shared: &Arc<Self>, source: St) -> Result<EngineHandle<M>, EngineError>
    where
        St: Stream<Item = M::Action> + Send + 'static,
    {
        let mut core = shared.lock();
        if let Some(run) = &core.run {
            return Err(EngineError::AlreadyRunning {
                run_id: run.id.to_string(),
            });
        }

        let id = RunId::generate();
        let span = tracing::info_span!("engine", name = %shared.config.name, run_id = %id);
        let (sender, receiver) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();

        if shared.states.is_terminated() || shared.data.is_terminated() {
            core.state = shared.initial_state.clone();
            core.data = shared.initial_data.clone();
            shared.data.reopen(shared.initial_data.clone());
            shared.states.reopen(shared.initial_state.clone());
        }
        core.history = StateHistory::new();
        core.run = Some(Run {
            id: id.clone(),
            feed: sender.clone(),
            stop: stop.clone(),
            effect: None,
            span: span.clone(),
        });
        span.in_scope(|| tracing::info!(state = core.state.name(), "engine started"));
        if let Err(error) = shared.enter(&mut core) {
            shared.abort(&mut core, error.clone());
            return Err(error);
        }
        drop(core);

        shared
            .runtime
            .spawn(forward_source(source, sender, stop.clone()).instrument(span.clone()));
        let join = shared
            .runtime
            .spawn(drive(Arc::clone(shared), id.clone(), receiver, stop).instrument(span));

        Ok(EngineHandle::new(id, Arc::clone(shared), join))
    }

    /// Begin a new occupancy of the current state: cancel the previous
    /// effect, then start the current state's effect if it declares one.
    /// A panicking template or executor fails with an [`EffectError`].
    fn enter(&self, core: &mut Core<M>) -> Result<(), EngineError> {
        core.occupancy += 1;
        let occupancy = core.occupancy;
        let Some(run) = core.run.as_mut() else {
            return Ok(());
        };

        if let Some(previous) = run.effect.take() {
            previous.cancel();
        }

        let Some(template) = self.definition.node(&core.state).effect() else {
            return Ok(());
        };

        let cancel = run.stop.child_token();
        let state = &core.state;
        let data = &core.data;
        let span = &run.span;
        let actions = contain(|| {
            let effect = template.create(data);
            span.in_scope(|| {
                tracing::debug!(state = state.name(), occupancy, ?effect, "starting effect")
            });
            Ok(self.machine.execute(effect, cancel.clone()))
        })
        .map_err(|fault| {
            cancel.cancel();
            EngineError::Effect(EffectError::new(fault.message()))
        })?;

        self.runtime.spawn(
            forward_effect(actions, occupancy, run.feed.clone(), cancel.clone())
                .instrument(run.span.clone()),
        );
        run.effect = Some(cancel);
        Ok(())
    }

    /// Handle one action from the merged feed. `origin` is the occupancy of
    /// the effect that produced it, `None` for the caller's source.
    ///
    /// Observer hooks run once the engine lock is released.
    fn process(
        &self,
        run_id: &RunId,
        origin: Option<u64>,
        action: M::Action,
    ) -> Result<(), EngineError> {
        let mut notices = Vec::with_capacity(2);
        let outcome = self.apply(run_id, origin, &action, &mut notices);
        for notice in notices {
            match notice {
                Notice::Data { previous, next } => {
                    self.observer.on_data_update(&action, &previous, &next)
                }
                Notice::State { state, data, next } => {
                    self.observer
                        .on_state_update(&action, &state, &data, next.as_ref())
                }
            }
        }
        outcome
    }

    fn apply(
        &self,
        run_id: &RunId,
        origin: Option<u64>,
        action: &M::Action,
        notices: &mut Vec<Notice<M>>,
    ) -> Result<(), EngineError> {
        let mut core = self.lock();
        if !core.run.as_ref().is_some_and(|run| run.id == *run_id) {
            return Ok(());
        }
        if origin.is_some_and(|occupancy| occupancy != core.occupancy) {
            tracing::trace!(?action, "dropping action from a finished effect");
            return Ok(());
        }

        let node = self.definition.node(&core.state);

        let reduced = match node.reducer() {
            Some(reducer) => reducer
                .reduce(action, &core.data)
                .map_err(|fault| self.policy_error(&core.state, action, PolicyStage::Reducer, fault))?,
            None => None,
        };

        let decision = match node.transitions().guard_for(action) {
            Some(guard) => guard
                .decide(action, reduced.as_ref().unwrap_or(&core.data))
                .map_err(|fault| self.policy_error(&core.state, action, PolicyStage::Guard, fault))?,
            None => None,
        };

        if let Some(next) = reduced {
            let previous = std::mem::replace(&mut core.data, next.clone());
            self.data.publish(next.clone());
            notices.push(Notice::Data { previous, next });
        }

        notices.push(Notice::State {
            state: core.state.clone(),
            data: core.data.clone(),
            next: decision.clone(),
        });

        if let Some(next) = decision {
            let transition = StateTransition {
                from: core.state.clone(),
                to: next.clone(),
                timestamp: Utc::now(),
                occupancy: core.occupancy + 1,
            };
            tracing::debug!(from = core.state.name(), to = next.name(), "state change");
            core.history = core
                .history
                .record_bounded(transition, self.config.history_limit);
            core.state = next.clone();
            self.states.publish(next);
            self.enter(&mut core)?;
        }
        Ok(())
    }

    /// An effect's stream failed. Only fatal while its occupancy lasts.
    fn effect_failed(
        &self,
        run_id: &RunId,
        occupancy: u64,
        error: EffectError,
    ) -> Result<(), EngineError> {
        let core = self.lock();
        let current = core.run.as_ref().is_some_and(|run| run.id == *run_id);
        if !current || occupancy != core.occupancy {
            tracing::debug!(%error, "ignoring failure of a finished effect");
            return Ok(());
        }
        Err(EngineError::Effect(error))
    }

    fn policy_error(
        &self,
        state: &M::State,
        action: &M::Action,
        stage: PolicyStage,
        fault: PolicyFault,
    ) -> EngineError {
        EngineError::Policy(PolicyError {
            state: state.name().to_string(),
            action: format!("{:?}", action.kind()),
            stage,
            message: fault.message().to_string(),
        })
    }

    /// End the run with `error`, delivering it on both streams.
    fn fail(&self, run_id: &RunId, error: EngineError) {
        let mut core = self.lock();
        if !core.run.as_ref().is_some_and(|run| run.id == *run_id) {
            return;
        }
        self.abort(&mut core, error);
    }

    fn abort(&self, core: &mut Core<M>, error: EngineError) {
        if let Some(run) = core.run.take() {
            if let Some(effect) = run.effect {
                effect.cancel();
            }
            run.stop.cancel();
            run.span
                .in_scope(|| tracing::error!(%error, state = core.state.name(), "engine failed"));
        }
        self.data.fail(error.clone());
        self.states.fail(error);
    }

    /// Stop the run identified by `run_id` and restore the initial values.
    pub(crate) fn teardown(&self, run_id: &RunId) {
        let mut core = self.lock();
        if !core.run.as_ref().is_some_and(|run| run.id == *run_id) {
            return;
        }
        if let Some(run) = core.run.take() {
            if let Some(effect) = run.effect {
                effect.cancel();
            }
            run.stop.cancel();
            run.span.in_scope(|| tracing::info!("engine torn down"));
        }
        self.restore(&mut core);
    }

    fn reset(&self) {
        let mut core = self.lock();
        if self.states.is_terminated() {
            tracing::debug!("reset ignored, engine has failed");
            return;
        }
        tracing::info!(name = %self.config.name, "engine reset");
        self.restore(&mut core);
        if let Err(error) = self.enter(&mut core) {
            self.abort(&mut core, error);
        }
    }

    /// Publish the initial data, then the initial state.
    fn restore(&self, core: &mut Core<M>) {
        core.data = self.initial_data.clone();
        core.state = self.initial_state.clone();
        self.data.publish(core.data.clone());
        self.states.publish(core.state.clone());
    }
}

/// The processing loop: the single consumer of the merged feed.
async fn drive<M: Machine>(
    shared: Arc<Shared<M>>,
    run_id: RunId,
    mut feed: UnboundedReceiver<Feed<M::Action>>,
    stop: CancellationToken,
) -> Result<(), EngineError> {
    loop {
        let next = tokio::select! {
            biased;
            _ = stop.cancelled() => {
                return shared.states.terminal_error().map_or(Ok(()), Err);
            }
            next = feed.recv() => next,
        };
        let Some(next) = next else {
            return Ok(());
        };

        let outcome = match next {
            Feed::Source(action) => shared.process(&run_id, None, action),
            Feed::Effect {
                occupancy,
                item: Ok(action),
            } => shared.process(&run_id, Some(occupancy), action),
            Feed::Effect {
                occupancy,
                item: Err(error),
            } => shared.effect_failed(&run_id, occupancy, error),
        };

        if let Err(error) = outcome {
            shared.fail(&run_id, error.clone());
            return Err(error);
        }
    }
}
