//! End-to-end checks through the public surface: raw wire bytes in,
//! state-change notifications out.

use abs_overlay::messaging::{Event, EventBus};
use abs_overlay::source::serial::drain_lines;
use abs_overlay::state::{GameStateMachine, Mode, RuleFired, SensorEvent};

#[test]
fn test_wire_bytes_to_walk_notification() {
    let bus = EventBus::new();
    let (rx, _id) = bus.subscribe();
    let mut machine = GameStateMachine::new(Mode::PitchCount, bus);

    let mut pending = b"B\nB\nB\nB\n".to_vec();
    for line in drain_lines(&mut pending) {
        machine.handle_line(&line);
    }

    let rules: Vec<_> = rx
        .try_iter()
        .filter_map(|event| match event {
            Event::StateChanged { rule, .. } => Some(rule),
            _ => None,
        })
        .collect();
    assert_eq!(rules.last(), Some(&RuleFired::Walk));

    let snapshot = machine.snapshot();
    assert_eq!(
        (snapshot.balls, snapshot.strikes, snapshot.outs),
        (0, 0, 0)
    );
}

#[test]
fn test_wire_contract_characters() {
    assert_eq!(SensorEvent::decode('B'), SensorEvent::Ball);
    assert_eq!(SensorEvent::decode('S'), SensorEvent::Strike);
    assert_eq!(SensorEvent::decode('C'), SensorEvent::Hit);
    assert_eq!(SensorEvent::decode('x'), SensorEvent::Unknown('x'));

    // lines are upper-cased before decoding, so lowercase input counts too
    let bus = EventBus::new();
    let mut machine = GameStateMachine::new(Mode::PitchCount, bus);
    machine.handle_line("bbs");

    let snapshot = machine.snapshot();
    assert_eq!((snapshot.balls, snapshot.strikes), (2, 1));
}

#[test]
fn test_noisy_wire_input_still_counts() {
    let mut pending = vec![b' ', 0xFF, b'B', b'S', b'\r', b'\n', b'C', b'\n'];
    let lines = drain_lines(&mut pending);
    assert_eq!(lines, vec!["BS".to_string(), "C".to_string()]);

    let bus = EventBus::new();
    let mut machine = GameStateMachine::new(Mode::TargetHit, bus);
    for line in &lines {
        machine.handle_line(line);
    }

    // target-hit mode: only the hit counts, the ball and strike are ignored
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.score, 100);
    assert_eq!((snapshot.balls, snapshot.strikes), (0, 0));
}

#[test]
fn test_handshake_digits_match_modes() {
    assert_eq!(Mode::PitchCount.handshake_byte(), "1");
    assert_eq!(Mode::TargetHit.handshake_byte(), "2");
}
