/// Hardware sources
///
/// One worker thread per device, each with the same lifecycle: `open` fails
/// synchronously when the device is unavailable, the loop checks a
/// cancellation flag each poll, and `stop()` joins the thread before
/// returning. Workers publish values onto the session channel and never
/// touch game state.
pub mod camera;
pub mod serial;
mod worker;

pub use camera::{CameraFrame, FrameSource};
pub use serial::SerialLineSource;
