use super::*;

#[test]
fn call_outcome_wire_roundtrip() {
    assert_eq!(CallOutcome::Success.as_wire(), "success");
    assert_eq!(CallOutcome::Failure.as_wire(), "failure");
    assert_eq!(CallOutcome::from_wire("success"), Some(CallOutcome::Success));
    assert_eq!(CallOutcome::from_wire("failure"), Some(CallOutcome::Failure));
    assert_eq!(CallOutcome::from_wire("bogus"), None);
}

#[test]
fn circuit_state_wire_roundtrip() {
    assert_eq!(CircuitState::Passing.as_wire(), "closed");
    assert_eq!(CircuitState::Blocking.as_wire(), "open");
    assert_eq!(CircuitState::from_wire("closed"), Some(CircuitState::Passing));
    assert_eq!(CircuitState::from_wire("open"), Some(CircuitState::Blocking));
}

#[test]
fn role_wire_values() {
    assert_eq!(Role::Leader.as_wire(), "leader");
    assert_eq!(Role::Follower.as_wire(), "follower");
}

#[test]
fn probe_kind_wire_values() {
    assert_eq!(ProbeKind::Recovery.as_wire(), "recovery");
    assert_eq!(ProbeKind::Idle.as_wire(), "idle");
}

#[test]
fn initial_state_event_is_passing_at_zero() {
    let initial = StateEvent::initial();
    assert_eq!(initial.id, "0");
    assert_eq!(initial.state, CircuitState::Passing);
    assert_eq!(initial.timestamp_ms, 0);
}
