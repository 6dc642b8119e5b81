/// Event types for the overlay engine
///
/// Two families: `SourceEvent` values travel from hardware worker threads to
/// the single consumer thread, `Event` values are broadcast outward to
/// presentation subscribers (past tense, things that happened).
use std::sync::Arc;

use crate::source::CameraFrame;
use crate::state::{GameSnapshot, Mode, RuleFired};

/// Which hardware source an event or status refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Serial,
    Camera,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Serial => "serial",
            SourceKind::Camera => "camera",
        }
    }
}

/// Connection state of a hardware source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error(String),
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Raw output of a hardware worker thread, delivered in emission order
/// over the session channel. Values are immutable once sent; workers never
/// touch game state directly.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// One decoded, trimmed, non-empty line from the serial sensor
    Line(String),

    /// One captured camera frame, already in the presentation pixel format
    Frame(CameraFrame),

    /// A connection-state transition of a source. Emitted once per
    /// transition, never re-emitted on every poll.
    Status {
        source: SourceKind,
        status: ConnectionStatus,
    },
}

/// Broadcast notifications for presentation subscribers
#[derive(Debug, Clone)]
pub enum Event {
    /// The game state mutated; carries the new snapshot plus the rule that
    /// fired so subscribers can pick effects without re-deriving them.
    StateChanged {
        snapshot: GameSnapshot,
        rule: RuleFired,
    },

    /// A hardware source changed connection state
    SourceStatus {
        source: SourceKind,
        status: ConnectionStatus,
    },

    /// A camera frame is ready to render
    FrameReady { frame: Arc<CameraFrame> },

    /// An operating mode was confirmed and a session is starting
    ModeSelected { mode: Mode },

    /// The application is shutting down
    Shutdown,
}

impl Event {
    /// Human-readable description, used for the play-by-play log
    pub fn description(&self) -> String {
        match self {
            Event::StateChanged { snapshot, rule } => match rule {
                RuleFired::Hit => {
                    format!("{} (total: {})", rule.commentary(), snapshot.score)
                }
                _ => format!(
                    "{} [B{} S{} O{}]",
                    rule.commentary(),
                    snapshot.balls,
                    snapshot.strikes,
                    snapshot.outs
                ),
            },
            Event::SourceStatus { source, status } => {
                format!("{} {}", source.label(), status)
            }
            Event::FrameReady { frame } => {
                format!("frame ready {}x{}", frame.width(), frame.height())
            }
            Event::ModeSelected { mode } => format!("mode selected: {}", mode.label()),
            Event::Shutdown => "shutting down".to_string(),
        }
    }
}
