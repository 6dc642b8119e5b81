/// Camera frame source
///
/// Owns the camera device exclusively. The worker thread blocks on capture,
/// converts each frame to the presentation pixel format (RGB8), and emits it
/// as an event. Transient capture failures sleep and retry; only `stop()`
/// ends the loop.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{info, warn};

use super::worker::SourceWorker;
use crate::error::CameraError;
use crate::messaging::{ConnectionStatus, SourceEvent, SourceKind};

const RETRY_DELAY: Duration = Duration::from_millis(10);

/// One captured frame in the presentation pixel format
#[derive(Clone)]
pub struct CameraFrame {
    image: RgbImage,
}

impl CameraFrame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

pub struct FrameSource {
    events: Sender<SourceEvent>,
    worker: SourceWorker,
}

impl FrameSource {
    /// Open the camera and start the capture loop. Fails when the device
    /// cannot be opened or its stream cannot be started.
    pub fn open(index: u32, events: Sender<SourceEvent>) -> Result<Self, CameraError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|source| CameraError::OpenFailed { index, source })?;
        camera
            .open_stream()
            .map_err(|source| CameraError::StreamFailed { index, source })?;

        info!("Camera {} open ({})", index, camera.camera_format());
        let _ = events.send(SourceEvent::Status {
            source: SourceKind::Camera,
            status: ConnectionStatus::Connected,
        });

        let worker = {
            let events = events.clone();
            SourceWorker::spawn(move |running| capture_loop(camera, running, events))
        };

        Ok(Self { events, worker })
    }

    /// Same join contract as the serial source: idempotent, blocks until
    /// the worker has terminated and the device is released.
    pub fn stop(&mut self) {
        if self.worker.stop(&self.events, SourceKind::Camera) {
            info!("Camera source stopped");
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(mut camera: Camera, running: Arc<AtomicBool>, events: Sender<SourceEvent>) {
    while running.load(Ordering::SeqCst) {
        match camera.frame() {
            Ok(buffer) => match buffer.decode_image::<RgbFormat>() {
                Ok(image) => {
                    let _ = events.send(SourceEvent::Frame(CameraFrame::new(image)));
                }
                Err(err) => {
                    warn!("Frame decode failed, retrying: {err}");
                    thread::sleep(RETRY_DELAY);
                }
            },
            Err(err) => {
                warn!("Frame capture failed, retrying: {err}");
                thread::sleep(RETRY_DELAY);
            }
        }
    }
    if let Err(err) = camera.stop_stream() {
        warn!("Failed to stop camera stream cleanly: {err}");
    }
}
