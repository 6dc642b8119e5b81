/// Shared worker-thread lifecycle for hardware sources
///
/// Owns the cancellation flag and the thread handle. `stop` swaps the flag,
/// joins the thread, and emits the `Disconnected` status; only the call
/// that actually stopped the worker emits anything, later calls are no-ops.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Sender;

use crate::messaging::{ConnectionStatus, SourceEvent, SourceKind};

pub(crate) struct SourceWorker {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SourceWorker {
    /// Spawn the worker loop. The body must observe the flag going false
    /// within one poll interval and exit.
    pub fn spawn<F>(body: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || body(flag));
        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Signal the loop to exit and block until the thread has terminated.
    /// Returns true only on the call that actually stopped the worker.
    pub fn stop(&mut self, events: &Sender<SourceEvent>, source: SourceKind) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = events.send(SourceEvent::Status {
            source,
            status: ConnectionStatus::Disconnected,
        });
        true
    }
}
