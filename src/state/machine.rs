/// Game-state machine
///
/// Single-threaded consumer of decoded sensor events. Owns all counter
/// mutation; worker threads only ever hand it immutable values. Every
/// mutation publishes a `StateChanged` notification carrying the new
/// snapshot and the rule that fired.
use tracing::debug;

use super::game_state::{
    GameSnapshot, GameState, Mode, RuleFired, SensorEvent, BALL_CAP, HIT_SCORE, OUT_CAP,
    STRIKE_CAP,
};
use crate::messaging::{Event, EventBus};

pub struct GameStateMachine {
    state: GameState,
    bus: EventBus,
}

impl GameStateMachine {
    /// Create a machine for the chosen mode with all counters zero.
    /// The mode is immutable for the lifetime of the instance; switching
    /// modes means building a new machine.
    pub fn new(mode: Mode, bus: EventBus) -> Self {
        Self {
            state: GameState::new(mode),
            bus,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.state.snapshot()
    }

    /// Apply one raw serial line. A line may carry several characters, each
    /// decoded to its own event and applied strictly left-to-right. Input is
    /// upper-cased first; the wire contract is case-insensitive.
    pub fn handle_line(&mut self, line: &str) {
        for ch in line.trim().to_uppercase().chars() {
            self.apply(SensorEvent::decode(ch));
        }
    }

    /// Apply one decoded event under the active mode's rule set. Events
    /// without a rule in the active mode are ignored without error.
    pub fn apply(&mut self, event: SensorEvent) {
        match (self.state.mode, event) {
            (Mode::PitchCount, SensorEvent::Ball) => self.add_ball(),
            (Mode::PitchCount, SensorEvent::Strike) => self.add_strike(),
            (Mode::TargetHit, SensorEvent::Hit) => self.add_hit(),
            (_, SensorEvent::Unknown(ch)) => {
                debug!("ignoring unrecognized sensor character {:?}", ch);
            }
            _ => {}
        }
    }

    /// Ball rule: the event that would make balls exceed the cap is a walk;
    /// the walk resets ball and strike counts, outs are untouched.
    fn add_ball(&mut self) {
        self.state.inning_event_count += 1;
        if self.state.balls < BALL_CAP {
            self.state.balls += 1;
            self.emit(RuleFired::Ball);
        } else {
            self.state.balls = 0;
            self.state.strikes = 0;
            self.emit(RuleFired::Walk);
        }
    }

    /// Strike rule: the third strike is a strikeout, which resets the count
    /// and then feeds the out rule. The `Strikeout` notification precedes
    /// the resulting `Out`/`InningEnd` one.
    fn add_strike(&mut self) {
        self.state.inning_event_count += 1;
        if self.state.strikes < STRIKE_CAP {
            self.state.strikes += 1;
            self.emit(RuleFired::Strike);
        } else {
            self.state.balls = 0;
            self.state.strikes = 0;
            self.emit(RuleFired::Strikeout);
            self.add_out();
        }
    }

    /// Out rule: outs never stores 3. The increment that would get there
    /// resets outs to 0 and fires the distinct inning-end notification
    /// (presentation plays its cue and pauses the background track on it).
    /// Note outs resets only on reaching its own cap, not on walks or
    /// ordinary strikeouts.
    fn add_out(&mut self) {
        if self.state.outs < OUT_CAP {
            self.state.outs += 1;
            self.emit(RuleFired::Out);
        } else {
            self.state.outs = 0;
            self.state.inning_event_count = 0;
            self.emit(RuleFired::InningEnd);
        }
    }

    /// Hit rule (TargetHit mode): flat score increment, no cap
    fn add_hit(&mut self) {
        self.state.inning_event_count += 1;
        self.state.score += HIT_SCORE;
        self.emit(RuleFired::Hit);
    }

    fn emit(&self, rule: RuleFired) {
        debug_assert!(
            self.state.in_bounds(),
            "counter out of bounds after {:?}: {:?}",
            rule,
            self.state
        );
        debug!(
            rule = ?rule,
            balls = self.state.balls,
            strikes = self.state.strikes,
            outs = self.state.outs,
            score = self.state.score,
            "rule fired"
        );
        self.bus.publish(Event::StateChanged {
            snapshot: self.state.snapshot(),
            rule,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;

    fn machine(mode: Mode) -> (GameStateMachine, Receiver<Event>) {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        (GameStateMachine::new(mode, bus), rx)
    }

    fn fired_rules(rx: &Receiver<Event>) -> Vec<RuleFired> {
        let mut rules = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let Event::StateChanged { rule, .. } = event {
                rules.push(rule);
            }
        }
        rules
    }

    #[test]
    fn test_balls_accumulate_below_cap() {
        let (mut m, rx) = machine(Mode::PitchCount);
        m.handle_line("BBB");

        assert_eq!(m.snapshot().balls, 3);
        assert_eq!(fired_rules(&rx), vec![RuleFired::Ball; 3]);
    }

    #[test]
    fn test_fourth_ball_is_a_walk() {
        let (mut m, rx) = machine(Mode::PitchCount);
        for _ in 0..4 {
            m.handle_line("B");
        }

        let snap = m.snapshot();
        assert_eq!((snap.balls, snap.strikes, snap.outs), (0, 0, 0));
        assert_eq!(
            fired_rules(&rx),
            vec![
                RuleFired::Ball,
                RuleFired::Ball,
                RuleFired::Ball,
                RuleFired::Walk
            ]
        );
    }

    #[test]
    fn test_walk_resets_strikes_but_not_outs() {
        let (mut m, _rx) = machine(Mode::PitchCount);
        // put an out on the board first
        m.handle_line("SSS");
        assert_eq!(m.snapshot().outs, 1);

        m.handle_line("SBBBB");
        let snap = m.snapshot();
        assert_eq!(snap.balls, 0);
        assert_eq!(snap.strikes, 0);
        assert_eq!(snap.outs, 1);
    }

    #[test]
    fn test_third_strike_is_strikeout_then_out() {
        let (mut m, rx) = machine(Mode::PitchCount);
        m.handle_line("SSS");

        let snap = m.snapshot();
        assert_eq!((snap.balls, snap.strikes, snap.outs), (0, 0, 1));
        assert_eq!(
            fired_rules(&rx),
            vec![
                RuleFired::Strike,
                RuleFired::Strike,
                RuleFired::Strikeout,
                RuleFired::Out
            ]
        );
    }

    #[test]
    fn test_strikeout_with_two_outs_ends_inning() {
        let (mut m, rx) = machine(Mode::PitchCount);
        // two strikeouts put two outs on the board
        m.handle_line("SSSSSS");
        assert_eq!(m.snapshot().outs, 2);
        let _ = fired_rules(&rx);

        m.handle_line("SSS");
        let snap = m.snapshot();
        assert_eq!((snap.balls, snap.strikes, snap.outs), (0, 0, 0));
        assert_eq!(
            fired_rules(&rx),
            vec![
                RuleFired::Strike,
                RuleFired::Strike,
                RuleFired::Strikeout,
                RuleFired::InningEnd
            ]
        );
    }

    #[test]
    fn test_outs_never_stores_three() {
        let (mut m, rx) = machine(Mode::PitchCount);
        // nine strikeouts span three full innings
        for _ in 0..9 {
            m.handle_line("SSS");
            assert!(m.snapshot().outs <= 2);
        }
        let inning_ends = fired_rules(&rx)
            .into_iter()
            .filter(|r| *r == RuleFired::InningEnd)
            .count();
        assert_eq!(inning_ends, 3);
    }

    #[test]
    fn test_inning_end_resets_event_count() {
        let (mut m, _rx) = machine(Mode::PitchCount);
        m.handle_line("BSS");
        assert_eq!(m.snapshot().inning_event_count, 3);

        // finish the inning: 3rd strike × 3 batters
        m.handle_line("SSSSSSS");
        assert_eq!(m.snapshot().outs, 0);
        assert_eq!(m.snapshot().inning_event_count, 0);
    }

    #[test]
    fn test_per_character_order_preserved() {
        let (mut m, rx) = machine(Mode::PitchCount);
        m.handle_line("BBS");

        let snap = m.snapshot();
        assert_eq!(snap.balls, 2);
        assert_eq!(snap.strikes, 1);
        assert_eq!(
            fired_rules(&rx),
            vec![RuleFired::Ball, RuleFired::Ball, RuleFired::Strike]
        );
    }

    #[test]
    fn test_input_is_case_insensitive() {
        let (mut m, _rx) = machine(Mode::PitchCount);
        m.handle_line("bbs");

        let snap = m.snapshot();
        assert_eq!(snap.balls, 2);
        assert_eq!(snap.strikes, 1);
    }

    #[test]
    fn test_unknown_characters_are_ignored() {
        let (mut m, rx) = machine(Mode::PitchCount);
        m.handle_line("B?!x9S");

        let snap = m.snapshot();
        assert_eq!(snap.balls, 1);
        assert_eq!(snap.strikes, 1);
        assert_eq!(fired_rules(&rx).len(), 2);
    }

    #[test]
    fn test_target_hit_scores_flat_hundred() {
        let (mut m, rx) = machine(Mode::TargetHit);
        m.handle_line("CCC");

        assert_eq!(m.snapshot().score, 300);
        assert_eq!(fired_rules(&rx), vec![RuleFired::Hit; 3]);
    }

    #[test]
    fn test_target_hit_ignores_balls_and_strikes() {
        let (mut m, rx) = machine(Mode::TargetHit);
        m.handle_line("BSCBS");

        let snap = m.snapshot();
        assert_eq!(snap.balls, 0);
        assert_eq!(snap.strikes, 0);
        assert_eq!(snap.score, 100);
        assert_eq!(fired_rules(&rx), vec![RuleFired::Hit]);
    }

    #[test]
    fn test_pitch_count_ignores_hits() {
        let (mut m, rx) = machine(Mode::PitchCount);
        m.handle_line("C");

        assert_eq!(m.snapshot().score, 0);
        assert!(fired_rules(&rx).is_empty());
    }

    #[test]
    fn test_score_is_monotonic_in_target_hit() {
        let (mut m, _rx) = machine(Mode::TargetHit);
        let mut last = 0;
        for _ in 0..20 {
            m.handle_line("C");
            let score = m.snapshot().score;
            assert!(score >= last);
            assert_eq!(score - last, 100);
            last = score;
        }
    }

    #[test]
    fn test_notifications_carry_matching_snapshot() {
        let (mut m, rx) = machine(Mode::PitchCount);
        m.handle_line("B");

        match rx.try_recv().unwrap() {
            Event::StateChanged { snapshot, rule } => {
                assert_eq!(rule, RuleFired::Ball);
                assert_eq!(snapshot.balls, 1);
                assert_eq!(snapshot, m.snapshot());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_fresh_machine_per_mode_change() {
        let bus = EventBus::new();
        let mut first = GameStateMachine::new(Mode::PitchCount, bus.clone());
        first.handle_line("BBS");

        // discard-and-rebuild: the replacement starts from zero
        let second = GameStateMachine::new(Mode::TargetHit, bus);
        let snap = second.snapshot();
        assert_eq!((snap.balls, snap.strikes, snap.outs, snap.score), (0, 0, 0, 0));
        assert_eq!(second.mode(), Mode::TargetHit);
    }
}
