//! Asynchronous Counter
//!
//! This example shows an effect feeding actions back into the engine.
//!
//! Key concepts:
//! - Entering `Busy` starts an effect; leaving it cancels the effect
//! - The effect's actions are merged with the caller's actions
//! - Reducers run before guards, so the guard sees the new count
//!
//! Run with: cargo run --example async_counter

use futures::StreamExt;
use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
use reactive_fsm::core::State;
use reactive_fsm::engine::{ActionStream, Engine, EngineConfig, Machine};
use reactive_fsm::{action_enum, state_enum};
use std::error::Error;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Phase {
        Idle,
        Busy,
    }
}

action_enum! {
    enum CounterAction {
        Increment,
        Decrement,
        IncrementAsync,
        IncrementComplete,
    }
    kind: CounterActionKind
}

#[derive(Clone, Debug, PartialEq)]
struct Count {
    count: i64,
}

#[derive(Debug)]
enum CounterEffect {
    CompleteIncrement { delay: Duration },
}

struct Counter;

impl Machine for Counter {
    type State = Phase;
    type Action = CounterAction;
    type Data = Count;
    type Effect = CounterEffect;

    fn execute(&self, effect: CounterEffect, cancel: CancellationToken) -> ActionStream<CounterAction> {
        match effect {
            CounterEffect::CompleteIncrement { delay } => futures::stream::once(async move {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    _ = tokio::time::sleep(delay) => Some(Ok(CounterAction::IncrementComplete)),
                }
            })
            .filter_map(futures::future::ready)
            .boxed(),
        }
    }
}

fn step(action: &CounterAction, data: &Count) -> Option<Count> {
    let count = match action {
        CounterAction::Increment => data.count + 1,
        CounterAction::Decrement => data.count - 1,
        _ => return None,
    };
    Some(Count { count })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reactive_fsm=debug".parse()?))
        .init();

    println!("=== Asynchronous Counter ===\n");

    let config = EngineConfig::from_json(r#"{ "name": "counter", "history_limit": 16 }"#)?;

    let definition = DefinitionBuilder::new()
        .state(
            StateBuilder::new(Phase::Idle)
                .reduce(step)
                .goto(CounterActionKind::IncrementAsync, Phase::Busy),
        )
        .state(
            StateBuilder::new(Phase::Busy)
                .on_enter(|_| CounterEffect::CompleteIncrement {
                    delay: Duration::from_millis(200),
                })
                .reduce(|action: &CounterAction, data: &Count| {
                    matches!(action, CounterAction::IncrementComplete).then(|| Count {
                        count: data.count + 1,
                    })
                })
                .goto(CounterActionKind::IncrementComplete, Phase::Idle),
        )
        .build()?;

    let engine = Engine::builder(Counter)
        .definition(definition)
        .initial_state(Phase::Idle)
        .initial_data(Count { count: 0 })
        .config(config)
        .build()?;

    let mut states = engine.state_stream();
    let mut data = engine.data_stream();
    tokio::spawn(async move {
        while let Some(Ok(count)) = data.next().await {
            println!("  data:  {count:?}");
        }
    });

    let (actions, source) = mpsc::unbounded_channel();
    let _run = engine.start(UnboundedReceiverStream::new(source))?;

    actions.send(CounterAction::Increment)?;
    actions.send(CounterAction::IncrementAsync)?;

    // Idle (replayed), Busy, then Idle again once the effect completes.
    for _ in 0..3 {
        if let Some(state) = states.next().await {
            println!("  state: {:?}", state?);
        }
    }

    actions.send(CounterAction::Decrement)?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("\nFinal count: {}", engine.current_data().count);
    for transition in engine.history().transitions() {
        println!(
            "  {} -> {} (occupancy {})",
            transition.from.name(),
            transition.to.name(),
            transition.occupancy
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
