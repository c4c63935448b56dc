//! Effects feeding the loop: stale output, interleaving with the caller's
//! actions, and effects that panic while starting.

use futures::stream::{self, Stream, StreamExt};
use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
use reactive_fsm::engine::{ActionStream, EffectError, Engine, EngineError, Machine};
use reactive_fsm::{action_enum, state_enum};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

state_enum! {
    enum Mode {
        Idle,
        Listening,
        Bouncing,
        Flaky,
        Exploding,
        Cursed,
    }
}

action_enum! {
    enum Step {
        Listen,
        Bounce,
        Flake,
        Explode,
        Curse,
        Leave,
        Record(u32),
    }
    kind: StepKind
}

#[derive(Debug)]
enum Script {
    /// Replay the relay's channel, fed by the test.
    Listen,
    /// Emit these items at once.
    Emit(Vec<Result<Step, EffectError>>),
    /// Panic inside `execute`.
    Panic,
}

#[derive(Clone, Default)]
struct Relay {
    inbox: Arc<Mutex<Option<UnboundedReceiverStream<Step>>>>,
}

impl Relay {
    fn with_inbox() -> (Self, UnboundedSender<Step>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let relay = Self {
            inbox: Arc::new(Mutex::new(Some(UnboundedReceiverStream::new(receiver)))),
        };
        (relay, sender)
    }
}

impl Machine for Relay {
    type State = Mode;
    type Action = Step;
    type Data = Vec<u32>;
    type Effect = Script;

    fn execute(&self, script: Script, _: CancellationToken) -> ActionStream<Step> {
        match script {
            Script::Listen => match self.inbox.lock().unwrap().take() {
                Some(inbox) => inbox.map(Ok).boxed(),
                None => stream::empty().boxed(),
            },
            Script::Emit(items) => stream::iter(items).boxed(),
            Script::Panic => panic!("executor exploded"),
        }
    }
}

fn record(action: &Step, log: &Vec<u32>) -> Option<Vec<u32>> {
    match action {
        Step::Record(value) => {
            let mut log = log.clone();
            log.push(*value);
            Some(log)
        }
        _ => None,
    }
}

fn engine(relay: Relay, initial: Mode) -> Engine<Relay> {
    let definition = DefinitionBuilder::new()
        .state(
            StateBuilder::new(Mode::Idle)
                .reduce(record)
                .goto(StepKind::Listen, Mode::Listening)
                .goto(StepKind::Bounce, Mode::Bouncing)
                .goto(StepKind::Flake, Mode::Flaky)
                .goto(StepKind::Explode, Mode::Exploding)
                .goto(StepKind::Curse, Mode::Cursed),
        )
        .state(
            StateBuilder::new(Mode::Listening)
                .on_enter(|_| Script::Listen)
                .reduce(record)
                .goto(StepKind::Leave, Mode::Idle),
        )
        .state(
            StateBuilder::new(Mode::Bouncing)
                .on_enter(|_| Script::Emit(vec![Ok(Step::Leave), Ok(Step::Record(100))]))
                .goto(StepKind::Leave, Mode::Idle),
        )
        .state(
            StateBuilder::new(Mode::Flaky)
                .on_enter(|_| {
                    Script::Emit(vec![Ok(Step::Leave), Err(EffectError::new("late failure"))])
                })
                .goto(StepKind::Leave, Mode::Idle),
        )
        .state(StateBuilder::new(Mode::Exploding).on_enter(|_| Script::Panic))
        .state(StateBuilder::new(Mode::Cursed).on_enter(|_: &Vec<u32>| -> Script {
            panic!("template exploded")
        }))
        .build()
        .unwrap();

    Engine::builder(relay)
        .definition(definition)
        .initial_state(initial)
        .initial_data(Vec::new())
        .build()
        .unwrap()
}

async fn next<S: Stream + Unpin>(stream: &mut S) -> S::Item {
    timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for the next event")
        .expect("stream ended")
}

async fn nothing_pending<S: Stream + Unpin>(stream: &mut S) -> bool {
    timeout(Duration::from_millis(50), stream.next()).await.is_err()
}

fn channel() -> (UnboundedSender<Step>, UnboundedReceiverStream<Step>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (sender, UnboundedReceiverStream::new(receiver))
}

#[tokio::test]
async fn effect_actions_after_leaving_the_state_are_dropped() {
    let engine = engine(Relay::default(), Mode::Idle);
    let mut states = engine.state_stream();
    let mut data = engine.data_stream();

    let (actions, source) = channel();
    let _run = engine.start(source).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));
    assert_eq!(next(&mut data).await, Ok(vec![]));

    // Both items are queued before the first is handled. The second belongs
    // to the finished occupancy and would be recorded by Idle's reducer.
    actions.send(Step::Bounce).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Bouncing));
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));

    assert!(nothing_pending(&mut data).await);
    assert!(nothing_pending(&mut states).await);
    assert_eq!(engine.current_data(), Vec::<u32>::new());
    assert!(engine.is_running());

    // The run still handles the caller's actions.
    actions.send(Step::Record(1)).unwrap();
    assert_eq!(next(&mut data).await, Ok(vec![1]));
}

#[tokio::test]
async fn effect_error_after_leaving_the_state_is_ignored() {
    let engine = engine(Relay::default(), Mode::Idle);
    let mut states = engine.state_stream();

    let (actions, source) = channel();
    let _run = engine.start(source).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));

    actions.send(Step::Flake).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Flaky));
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));

    assert!(nothing_pending(&mut states).await);
    assert!(engine.is_running());
    assert!(engine.terminal_error().is_none());
}

#[tokio::test]
async fn caller_and_effect_actions_share_one_order() {
    let (relay, inbox) = Relay::with_inbox();
    let engine = engine(relay, Mode::Idle);
    let mut states = engine.state_stream();
    let mut data = engine.data_stream();

    let (actions, source) = channel();
    let _run = engine.start(source).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));
    assert_eq!(next(&mut data).await, Ok(vec![]));

    actions.send(Step::Listen).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Listening));

    // Alternate the two sources; each data event extends the log by exactly
    // the action that arrived.
    let mut expected = Vec::new();
    for value in 1..=6 {
        if value % 2 == 0 {
            inbox.send(Step::Record(value)).unwrap();
        } else {
            actions.send(Step::Record(value)).unwrap();
        }
        expected.push(value);
        assert_eq!(next(&mut data).await, Ok(expected.clone()));
    }

    // The effect's Leave ends its own occupancy.
    inbox.send(Step::Leave).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));
    inbox.send(Step::Record(99)).ok();
    actions.send(Step::Record(7)).unwrap();
    expected.push(7);
    assert_eq!(next(&mut data).await, Ok(expected));
    assert!(nothing_pending(&mut data).await);
}

#[tokio::test]
async fn panicking_executor_ends_the_run() {
    let engine = engine(Relay::default(), Mode::Idle);
    let mut states = engine.state_stream();
    let mut data = engine.data_stream();

    let run = engine.start(stream::iter(vec![Step::Explode])).unwrap();

    assert_eq!(next(&mut states).await, Ok(Mode::Idle));
    assert_eq!(next(&mut states).await, Ok(Mode::Exploding));
    match next(&mut states).await {
        Err(EngineError::Effect(error)) => {
            assert_eq!(error.message(), "panicked: executor exploded")
        }
        other => panic!("expected an effect error, got {other:?}"),
    }
    assert_eq!(next(&mut data).await, Ok(vec![]));
    assert!(matches!(next(&mut data).await, Err(EngineError::Effect(_))));

    assert!(matches!(run.join().await, Err(EngineError::Effect(_))));
    assert!(!engine.is_running());
    assert!(engine.terminal_error().is_some());
}

#[tokio::test]
async fn panicking_template_in_the_initial_state_refuses_the_start() {
    let engine = engine(Relay::default(), Mode::Cursed);

    match engine.start(stream::empty()) {
        Err(EngineError::Effect(error)) => {
            assert_eq!(error.message(), "panicked: template exploded")
        }
        other => panic!("expected an effect error, got {:?}", other.map(|_| ())),
    }
    assert!(!engine.is_running());
    assert!(matches!(engine.terminal_error(), Some(EngineError::Effect(_))));

    // The failed start leaves no run behind to block the next one.
    assert!(matches!(
        engine.start(stream::empty()),
        Err(EngineError::Effect(_))
    ));
}

#[tokio::test]
async fn panicking_template_mid_run_ends_the_run() {
    let engine = engine(Relay::default(), Mode::Idle);
    let mut states = engine.state_stream();

    let (actions, source) = channel();
    let run = engine.start(source).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));

    actions.send(Step::Curse).unwrap();
    assert_eq!(next(&mut states).await, Ok(Mode::Cursed));
    assert!(matches!(next(&mut states).await, Err(EngineError::Effect(_))));
    assert!(run.join().await.is_err());

    // A new run starts over from the initial values.
    let (actions, source) = channel();
    let _run = engine.start(source).unwrap();
    let mut states = engine.state_stream();
    let mut data = engine.data_stream();
    assert_eq!(next(&mut states).await, Ok(Mode::Idle));
    assert_eq!(next(&mut data).await, Ok(vec![]));
    actions.send(Step::Record(3)).unwrap();
    assert_eq!(next(&mut data).await, Ok(vec![3]));
}
