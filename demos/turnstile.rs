//! Turnstile
//!
//! This example drives the classic coin-operated turnstile.
//!
//! Key concepts:
//! - Guards as the transitions themselves
//! - A reducer counting turns while unlocked
//! - Actions with no guard in the current state are ignored
//!
//! Run with: cargo run --example turnstile
//! Set RUST_LOG=reactive_fsm=trace to see every update.

use futures::StreamExt;
use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
use reactive_fsm::engine::{ActionStream, Engine, EngineConfig, Machine};
use reactive_fsm::{action_enum, state_enum};
use std::convert::Infallible;
use std::error::Error;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Gate {
        Locked,
        Unlocked,
    }
}

action_enum! {
    enum GateAction {
        InsertCoin,
        Turn,
    }
    kind: GateActionKind
}

#[derive(Clone, Debug, PartialEq)]
struct Turns {
    turn_count: u32,
}

struct Turnstile;

impl Machine for Turnstile {
    type State = Gate;
    type Action = GateAction;
    type Data = Turns;
    type Effect = Infallible;

    fn execute(&self, effect: Infallible, _: CancellationToken) -> ActionStream<GateAction> {
        match effect {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reactive_fsm=info".parse()?))
        .init();

    println!("=== Turnstile ===\n");

    let definition = DefinitionBuilder::new()
        .state(StateBuilder::new(Gate::Locked).goto(GateActionKind::InsertCoin, Gate::Unlocked))
        .state(
            StateBuilder::new(Gate::Unlocked)
                .reduce(|action: &GateAction, data: &Turns| {
                    matches!(action, GateAction::Turn).then(|| Turns {
                        turn_count: data.turn_count + 1,
                    })
                })
                .goto(GateActionKind::Turn, Gate::Locked),
        )
        .build()?;

    let engine = Engine::builder(Turnstile)
        .definition(definition)
        .initial_state(Gate::Locked)
        .initial_data(Turns { turn_count: 0 })
        .config(EngineConfig::named("turnstile"))
        .build()?;

    let mut states = engine.state_stream();
    let actions = vec![
        GateAction::Turn,
        GateAction::InsertCoin,
        GateAction::Turn,
        GateAction::InsertCoin,
        GateAction::Turn,
    ];
    println!("Feeding: {actions:?}\n");
    let run = engine.start(futures::stream::iter(actions))?;

    // Locked is replayed first, then two full Locked -> Unlocked -> Locked cycles.
    for _ in 0..5 {
        if let Some(state) = states.next().await {
            println!("  state: {:?}", state?);
        }
    }

    println!("\nTurns counted: {}", engine.current_data().turn_count);
    println!("Transitions recorded: {}", engine.history().len());

    run.dispose();
    println!("After dispose: {:?}", engine.current_state());

    println!("\n=== Example Complete ===");
    Ok(())
}
