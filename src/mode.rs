/// Mode selection during the intro phase
///
/// Tracks the highlighted mode while the selection screen is up and, on
/// confirmation, performs the hardware handshake and tears down the
/// intro-phase serial source. Both are fire-and-forget: a failed handshake
/// is reported as a status event and never blocks the transition.
use crossbeam_channel::Receiver;
use tracing::info;

use crate::messaging::{Event, EventBus, SourceEvent};
use crate::source::SerialLineSource;
use crate::state::Mode;

/// Directional navigation input from the selection screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub struct ModeController {
    highlighted: Mode,
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            highlighted: initial,
        }
    }

    pub fn highlighted(&self) -> Mode {
        self.highlighted
    }

    /// Move the highlight. The menu has two fixed entries: up is pitch
    /// count, down is target hit.
    pub fn navigate(&mut self, direction: Direction) {
        self.highlighted = match direction {
            Direction::Up => Mode::PitchCount,
            Direction::Down => Mode::TargetHit,
        };
    }

    /// Confirm the highlighted mode: write the handshake digit so the
    /// remote firmware switches, then stop the intro serial source so the
    /// session can reopen the device cleanly.
    pub fn confirm(&self, intro_serial: Option<SerialLineSource>) -> Mode {
        let mode = self.highlighted;
        if let Some(mut serial) = intro_serial {
            serial.send(mode.handshake_byte());
            serial.stop();
        }
        info!("Mode confirmed: {}", mode.label());
        mode
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(Mode::PitchCount)
    }
}

/// Drain pending intro-phase source events. Lines are informational only
/// at this stage; status transitions (including a failed handshake write)
/// are republished on the broadcast bus so presentation subscribers see
/// them. Call once more after `confirm`, which queues the final statuses.
pub fn forward_intro_events(events: &Receiver<SourceEvent>, bus: &EventBus) {
    while let Ok(event) = events.try_recv() {
        match event {
            SourceEvent::Line(line) => info!("Intro serial recv: {}", line),
            SourceEvent::Status { source, status } => {
                bus.publish(Event::SourceStatus { source, status });
            }
            SourceEvent::Frame(_) => {}
        }
    }
}
