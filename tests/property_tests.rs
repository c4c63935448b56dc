//! Property-based tests for the definition model and output streams.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use futures::{FutureExt, StreamExt};
use proptest::prelude::*;
use reactive_fsm::builder::{DefinitionBuilder, StateBuilder};
use reactive_fsm::core::{Guard, PolicyFault, State, StateHistory, StateTransition};
use reactive_fsm::stream::{Broadcast, Subscription};
use reactive_fsm::{action_enum, state_enum};

state_enum! {
    enum TestState {
        Initial,
        Processing,
        Complete,
        Failed,
    }
    final: [Complete, Failed]
    error: [Failed]
}

action_enum! {
    enum TestAction {
        Begin,
        Progress(u8),
        Finish,
    }
    kind: TestActionKind
}

prop_compose! {
    fn arbitrary_state()(variant in 0..4u8) -> TestState {
        match variant {
            0 => TestState::Initial,
            1 => TestState::Processing,
            2 => TestState::Complete,
            _ => TestState::Failed,
        }
    }
}

prop_compose! {
    fn arbitrary_kind()(variant in 0..3u8) -> TestActionKind {
        match variant {
            0 => TestActionKind::Begin,
            1 => TestActionKind::Progress,
            _ => TestActionKind::Finish,
        }
    }
}

fn history_through(states: &[TestState]) -> StateHistory<TestState> {
    let mut history = StateHistory::new();
    let mut from = TestState::Initial;
    for (i, to) in states.iter().enumerate() {
        history = history.record(StateTransition {
            from: from.clone(),
            to: to.clone(),
            timestamp: Utc::now(),
            occupancy: i as u64 + 2,
        });
        from = to.clone();
    }
    history
}

fn drain_ready(subscription: &mut Subscription<u32, String>) -> Vec<Result<u32, String>> {
    let mut seen = Vec::new();
    while let Some(Some(item)) = subscription.next().now_or_never() {
        seen.push(item);
    }
    seen
}

proptest! {
    #[test]
    fn guard_is_deterministic(state in arbitrary_state(), progress in any::<u8>()) {
        let guard = Guard::new(|action: &TestAction, data: &TestState| match action {
            TestAction::Progress(p) if *p > 100 && !data.is_final() => Some(TestState::Complete),
            _ => None,
        });
        let action = TestAction::Progress(progress);

        prop_assert_eq!(guard.decide(&action, &state), guard.decide(&action, &state));
    }

    #[test]
    fn panicking_guard_becomes_fault(message in "[a-z ]{1,20}") {
        let expected = format!("panicked: {message}");
        let guard = Guard::<TestState, (), ()>::new(move |_, _| panic!("{}", message));

        prop_assert_eq!(guard.decide(&(), &()), Err(PolicyFault::new(expected)));
    }

    #[test]
    fn history_preserves_order(states in prop::collection::vec(arbitrary_state(), 1..10)) {
        let history = history_through(&states);

        let mut expected = vec![&TestState::Initial];
        expected.extend(states.iter());
        prop_assert_eq!(history.get_path(), expected);
    }

    #[test]
    fn history_record_is_pure(from in arbitrary_state(), to in arbitrary_state()) {
        let history = StateHistory::new();

        let new_history = history.record(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            occupancy: 2,
        });

        prop_assert!(history.is_empty());
        prop_assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn bounded_history_keeps_newest(
        states in prop::collection::vec(arbitrary_state(), 0..20),
        limit in 0..8usize,
    ) {
        let mut history = StateHistory::new();
        let mut from = TestState::Initial;
        for (i, to) in states.iter().enumerate() {
            let transition = StateTransition {
                from: from.clone(),
                to: to.clone(),
                timestamp: Utc::now(),
                occupancy: i as u64,
            };
            history = history.record_bounded(transition, limit);
            from = to.clone();
        }

        prop_assert_eq!(history.len(), states.len().min(limit));
        if let Some(last) = history.transitions().last() {
            prop_assert_eq!(last.occupancy, states.len() as u64 - 1);
        }
    }

    #[test]
    fn history_roundtrip_serialization(states in prop::collection::vec(arbitrary_state(), 0..5)) {
        let history = history_through(&states);

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<TestState> = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(history.get_path(), deserialized.get_path());
    }

    #[test]
    fn duplicate_kinds_are_rejected(kinds in prop::collection::vec(arbitrary_kind(), 1..6)) {
        let builder = kinds.iter().fold(
            StateBuilder::<TestState, TestAction, (), ()>::new(TestState::Initial),
            |builder, kind| builder.goto(*kind, TestState::Processing),
        );
        let result = DefinitionBuilder::new().state(builder).build();

        let mut distinct = kinds.clone();
        distinct.sort_by_key(|kind| *kind as u8);
        distinct.dedup();
        let duplicated = kinds.len() != distinct.len();

        prop_assert_eq!(result.is_err(), duplicated);
    }

    #[test]
    fn every_subscriber_sees_the_same_sequence(values in prop::collection::vec(any::<u32>(), 0..20)) {
        let broadcast = Broadcast::<u32, String>::new(0);
        let mut first = broadcast.subscribe();
        let mut second = broadcast.subscribe();

        for value in &values {
            broadcast.publish(*value);
        }

        let mut expected: Vec<Result<u32, String>> = vec![Ok(0)];
        expected.extend(values.iter().copied().map(Ok));
        prop_assert_eq!(drain_ready(&mut first), expected.clone());
        prop_assert_eq!(drain_ready(&mut second), expected);
    }

    #[test]
    fn late_subscriber_replays_latest(values in prop::collection::vec(any::<u32>(), 1..20)) {
        let broadcast = Broadcast::<u32, String>::new(0);
        let _early = broadcast.subscribe();

        for value in &values {
            broadcast.publish(*value);
        }

        let mut late = broadcast.subscribe();
        let expected: Vec<Result<u32, String>> = vec![Ok(*values.last().unwrap())];
        prop_assert_eq!(drain_ready(&mut late), expected);
    }
}
