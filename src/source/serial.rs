/// Serial sensor source
///
/// Owns the serial device exclusively for its lifetime. A worker thread
/// polls for available bytes, accumulates until newline, and emits decoded,
/// trimmed, non-empty lines. The consumer side only ever sees event values;
/// read failures end the loop and surface as a status event.
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serialport::SerialPort;
use tracing::{info, warn};

use super::worker::SourceWorker;
use crate::error::SerialError;
use crate::messaging::{ConnectionStatus, SourceEvent, SourceKind};

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

pub struct SerialLineSource {
    port: SharedPort,
    events: Sender<SourceEvent>,
    worker: SourceWorker,
}

impl SerialLineSource {
    /// Open the port and start the read loop. Fails when the device cannot
    /// be opened; once this returns Ok the caller has already been sent a
    /// `Connected` status.
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        poll_interval: Duration,
        events: Sender<SourceEvent>,
    ) -> Result<Self, SerialError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|source| SerialError::OpenFailed {
                port: port_name.to_string(),
                source,
            })?;

        info!("Serial port {} open at {} baud", port_name, baud_rate);
        let _ = events.send(SourceEvent::Status {
            source: SourceKind::Serial,
            status: ConnectionStatus::Connected,
        });

        let port: SharedPort = Arc::new(Mutex::new(port));
        let worker = {
            let port = Arc::clone(&port);
            let events = events.clone();
            SourceWorker::spawn(move |running| read_loop(port, running, poll_interval, events))
        };

        Ok(Self {
            port,
            events,
            worker,
        })
    }

    /// Best-effort outbound write (mode handshake). Failure is reported as
    /// a status event, never raised to the caller.
    pub fn send(&self, text: &str) {
        let result = {
            let mut port = self.port.lock();
            port.write_all(text.as_bytes()).and_then(|_| port.flush())
        };
        match result {
            Ok(()) => info!("Serial write ok: {:?}", text),
            Err(err) => {
                let err = SerialError::WriteFailed(err);
                warn!("{err}");
                let _ = self.events.send(SourceEvent::Status {
                    source: SourceKind::Serial,
                    status: ConnectionStatus::Error(err.to_string()),
                });
            }
        }
    }

    /// Signal the read loop to exit and block until the worker thread has
    /// terminated. Idempotent; the device handle is released before this
    /// returns. Safe to call from the consumer thread mid-poll, which means
    /// waiting up to one poll interval.
    pub fn stop(&mut self) {
        if self.worker.stop(&self.events, SourceKind::Serial) {
            info!("Serial source stopped");
        }
    }
}

impl Drop for SerialLineSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(
    port: SharedPort,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
    events: Sender<SourceEvent>,
) {
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 256];

    while running.load(Ordering::SeqCst) {
        // Lock only around the device call so outbound writes interleave
        let available = { port.lock().bytes_to_read() };
        match available {
            Ok(0) => {}
            Ok(_) => {
                let read = { port.lock().read(&mut chunk) };
                match read {
                    Ok(0) => {}
                    Ok(n) => {
                        pending.extend_from_slice(&chunk[..n]);
                        for line in drain_lines(&mut pending) {
                            let _ = events.send(SourceEvent::Line(line));
                        }
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(err) => {
                        warn!("Serial read failed, stopping source: {err}");
                        let _ = events.send(SourceEvent::Status {
                            source: SourceKind::Serial,
                            status: ConnectionStatus::Error(format!("read failed: {err}")),
                        });
                        return;
                    }
                }
            }
            Err(err) => {
                warn!("Serial poll failed, stopping source: {err}");
                let _ = events.send(SourceEvent::Status {
                    source: SourceKind::Serial,
                    status: ConnectionStatus::Error(format!("poll failed: {err}")),
                });
                return;
            }
        }
        thread::sleep(poll_interval);
    }
}

/// Split accumulated bytes on newlines into trimmed lines. Malformed byte
/// sequences are dropped, not fatal; empty lines are skipped. Bytes after
/// the last terminator stay buffered for the next read.
pub fn drain_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        let text: String = String::from_utf8_lossy(&raw)
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines
}
