#![allow(non_snake_case)]

use super::*;

#[test]
fn RunState___default___is_prepare() {
    let state = RunState::default();

    assert_eq!(state, RunState::Prepare);
}

#[test]
fn RunState___prepare_to_failed___skips_remaining_phases() {
    let state = RunState::Prepare;

    let can_transition = state.can_transition_to(RunState::Failed);

    assert!(can_transition);
}

#[test]
fn RunState___execute_to_failed___must_pass_through_finalize() {
    let state = RunState::Execute;

    let can_transition = state.can_transition_to(RunState::Failed);

    assert!(!can_transition);
}

#[test]
fn RunState___terminal_states___have_no_phase() {
    assert!(RunState::Completed.phase().is_none());
    assert!(RunState::Failed.phase().is_none());
}

#[test]
fn RunState___terminal_states___cannot_transition() {
    let targets = [
        RunState::Prepare,
        RunState::Execute,
        RunState::Finalize,
        RunState::Completed,
        RunState::Failed,
    ];

    for target in targets {
        assert!(!RunState::Completed.can_transition_to(target));
        assert!(!RunState::Failed.can_transition_to(target));
    }
}

#[test]
fn RunState___serialize___uses_snake_case() {
    let json = serde_json::to_string(&RunState::Completed).unwrap();

    assert_eq!(json, "\"completed\"");
}

#[test]
fn Phase___all___ordered_prepare_execute_finalize() {
    assert_eq!(
        Phase::ALL,
        [Phase::Prepare, Phase::Execute, Phase::Finalize]
    );
}

#[test]
fn Phase___display___lowercase_name() {
    assert_eq!(Phase::Finalize.to_string(), "finalize");
}
