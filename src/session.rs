/// A running game session
///
/// Bundles the state machine with its source pair so a mode change can
/// discard and rebuild everything as a unit. The session runs on the
/// consumer thread: it drains the source channel, feeds lines to the state
/// machine, and republishes frames and status transitions on the broadcast
/// bus for presentation.
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{info, warn};

use crate::config::Config;
use crate::messaging::{Event, EventBus, SourceEvent, SourceKind};
use crate::source::{FrameSource, SerialLineSource};
use crate::state::{GameSnapshot, GameStateMachine, Mode};

pub struct Session {
    machine: GameStateMachine,
    serial: Option<SerialLineSource>,
    camera: Option<FrameSource>,
    events: Receiver<SourceEvent>,
    // Keeps the channel open while a source is absent or has exited, so
    // `pump` blocks for its full timeout instead of spinning on disconnect
    #[allow(dead_code)]
    events_tx: Sender<SourceEvent>,
    bus: EventBus,
}

impl Session {
    /// Build a fresh machine and open both sources. A source that fails to
    /// open is reported as a status event and left absent; the session runs
    /// degraded rather than failing.
    pub fn start(config: &Config, mode: Mode, bus: EventBus) -> Session {
        bus.publish(Event::ModeSelected { mode });

        let (tx, rx) = unbounded();

        let serial = match SerialLineSource::open(
            &config.serial_port,
            config.baud_rate,
            config.poll_interval(),
            tx.clone(),
        ) {
            Ok(source) => Some(source),
            Err(err) => {
                warn!("Running without sensor input: {err:#}");
                bus.publish(Event::SourceStatus {
                    source: SourceKind::Serial,
                    status: crate::messaging::ConnectionStatus::Error(err.to_string()),
                });
                None
            }
        };

        let camera = match FrameSource::open(config.camera_index, tx.clone()) {
            Ok(source) => Some(source),
            Err(err) => {
                warn!("Running without video: {err:#}");
                bus.publish(Event::SourceStatus {
                    source: SourceKind::Camera,
                    status: crate::messaging::ConnectionStatus::Error(err.to_string()),
                });
                None
            }
        };

        info!(
            "Session started in {} mode (serial: {}, camera: {})",
            mode.label(),
            serial.is_some(),
            camera.is_some()
        );

        Session {
            machine: GameStateMachine::new(mode, bus.clone()),
            serial,
            camera,
            events: rx,
            events_tx: tx,
            bus,
        }
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.machine.snapshot()
    }

    /// Wait up to `timeout` for source events and process everything that
    /// has arrived. Returns true when at least one event was handled.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.dispatch(event);
                while let Ok(event) = self.events.try_recv() {
                    self.dispatch(event);
                }
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn dispatch(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Line(line) => self.machine.handle_line(&line),
            SourceEvent::Frame(frame) => {
                self.bus.publish(Event::FrameReady {
                    frame: Arc::new(frame),
                });
            }
            SourceEvent::Status { source, status } => {
                info!("{} source {}", source.label(), status);
                self.bus.publish(Event::SourceStatus { source, status });
            }
        }
    }

    /// Stop both sources, joining their worker threads, and drop the
    /// machine. Called on shutdown and before rebuilding for a new mode.
    pub fn shutdown(mut self) {
        if let Some(mut serial) = self.serial.take() {
            serial.stop();
        }
        if let Some(mut camera) = self.camera.take() {
            camera.stop();
        }
        // surface the teardown statuses queued by stop()
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
        }
        info!("Session shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::ConnectionStatus;
    use crate::source::CameraFrame;
    use crate::state::RuleFired;
    use image::RgbImage;

    fn test_session(mode: Mode) -> (Session, Receiver<Event>) {
        let bus = EventBus::new();
        let (subscriber, _id) = bus.subscribe();
        let (tx, rx) = unbounded();
        let session = Session {
            machine: GameStateMachine::new(mode, bus.clone()),
            serial: None,
            camera: None,
            events: rx,
            events_tx: tx,
            bus,
        };
        (session, subscriber)
    }

    #[test]
    fn test_lines_drive_the_machine() {
        let (mut session, subscriber) = test_session(Mode::PitchCount);
        let tx = session.events_tx.clone();

        tx.send(SourceEvent::Line("BBS".to_string())).unwrap();
        assert!(session.pump(Duration::from_millis(100)));

        let snap = session.snapshot();
        assert_eq!((snap.balls, snap.strikes), (2, 1));

        let rules: Vec<_> = subscriber
            .try_iter()
            .filter_map(|event| match event {
                Event::StateChanged { rule, .. } => Some(rule),
                _ => None,
            })
            .collect();
        assert_eq!(
            rules,
            vec![RuleFired::Ball, RuleFired::Ball, RuleFired::Strike]
        );
    }

    #[test]
    fn test_frames_are_republished_for_presentation() {
        let (mut session, subscriber) = test_session(Mode::PitchCount);
        let tx = session.events_tx.clone();

        let frame = CameraFrame::new(RgbImage::new(4, 2));
        tx.send(SourceEvent::Frame(frame)).unwrap();
        assert!(session.pump(Duration::from_millis(100)));

        match subscriber.try_recv().unwrap() {
            Event::FrameReady { frame } => {
                assert_eq!(frame.width(), 4);
                assert_eq!(frame.height(), 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_status_transitions_are_forwarded() {
        let (mut session, subscriber) = test_session(Mode::TargetHit);
        let tx = session.events_tx.clone();

        tx.send(SourceEvent::Status {
            source: SourceKind::Serial,
            status: ConnectionStatus::Connected,
        })
        .unwrap();
        session.pump(Duration::from_millis(100));

        match subscriber.try_recv().unwrap() {
            Event::SourceStatus { source, status } => {
                assert_eq!(source, SourceKind::Serial);
                assert_eq!(status, ConnectionStatus::Connected);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_pump_times_out_when_idle() {
        let (mut session, _subscriber) = test_session(Mode::PitchCount);
        assert!(!session.pump(Duration::from_millis(5)));
    }

    #[test]
    fn test_events_processed_in_arrival_order() {
        let (mut session, _subscriber) = test_session(Mode::TargetHit);
        let tx = session.events_tx.clone();

        for _ in 0..5 {
            tx.send(SourceEvent::Line("C".to_string())).unwrap();
        }
        session.pump(Duration::from_millis(100));

        assert_eq!(session.snapshot().score, 500);
    }
}
