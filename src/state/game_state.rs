/// Core game-state data model
///
/// Counters live in fixed windows: balls 0..=3, strikes 0..=2, outs 0..=2.
/// A counter reaching its cap fires a transition on the next matching event
/// instead of exceeding the cap; the cap is never stored past one tick.
use serde::{Deserialize, Serialize};

pub const BALL_CAP: u8 = 3;
pub const STRIKE_CAP: u8 = 2;
pub const OUT_CAP: u8 = 2;

/// Points awarded per target hit in TargetHit mode
pub const HIT_SCORE: u32 = 100;

/// Operating mode, chosen once in the intro phase. A mode change rebuilds
/// the machine and its sources as a unit instead of mutating in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Serial events drive ball/strike/out counting
    #[default]
    PitchCount,

    /// Serial hit events drive a flat score increment
    TargetHit,
}

impl Mode {
    /// Handshake digit written to the sensor device on mode confirmation,
    /// so the remote hardware runs the matching firmware mode.
    pub fn handshake_byte(&self) -> &'static str {
        match self {
            Mode::PitchCount => "1",
            Mode::TargetHit => "2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::PitchCount => "pitch count",
            Mode::TargetHit => "target hit",
        }
    }
}

/// One decoded sensor character. Transient: created by decode, consumed
/// once by the state machine, discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    Ball,
    Strike,
    Hit,
    Unknown(char),
}

impl SensorEvent {
    /// Decode one upper-cased line character. Characters are independently
    /// meaningful; anything outside the table is ignored downstream.
    pub fn decode(ch: char) -> Self {
        match ch {
            'B' => SensorEvent::Ball,
            'S' => SensorEvent::Strike,
            'C' => SensorEvent::Hit,
            other => SensorEvent::Unknown(other),
        }
    }
}

/// Which transition rule fired, named so the presentation layer can pick
/// effect and sound without re-deriving it from the raw counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFired {
    Ball,
    Walk,
    Strike,
    Strikeout,
    Out,
    InningEnd,
    Hit,
}

impl RuleFired {
    /// Play-by-play line for the commentary window
    pub fn commentary(&self) -> &'static str {
        match self {
            RuleFired::Ball => "Ball!",
            RuleFired::Walk => "Walk! Batter takes first",
            RuleFired::Strike => "Strike!",
            RuleFired::Strikeout => "Struck out!",
            RuleFired::Out => "Out!",
            RuleFired::InningEnd => "Inning over! Out count cleared",
            RuleFired::Hit => "Target hit! +100",
        }
    }
}

/// Authoritative game state, owned and mutated by exactly one thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub score: u32,
    pub mode: Mode,
    /// Sensor events applied since the last inning reset
    pub inning_event_count: u32,
}

impl GameState {
    pub fn new(mode: Mode) -> Self {
        Self {
            balls: 0,
            strikes: 0,
            outs: 0,
            score: 0,
            mode,
            inning_event_count: 0,
        }
    }

    /// Immutable copy handed to presentation subscribers
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            balls: self.balls,
            strikes: self.strikes,
            outs: self.outs,
            score: self.score,
            mode: self.mode,
            inning_event_count: self.inning_event_count,
        }
    }

    /// Counter bounds are an internal invariant; a violation is a
    /// programming error, not a runtime condition.
    pub fn in_bounds(&self) -> bool {
        self.balls <= BALL_CAP && self.strikes <= STRIKE_CAP && self.outs <= OUT_CAP
    }
}

/// Point-in-time copy of the game state carried on every notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot {
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    pub score: u32,
    pub mode: Mode,
    pub inning_event_count: u32,
}
