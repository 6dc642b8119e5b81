//! Event-ingestion and game-state engine for the ABS broadcast overlay.
//!
//! Hardware sources (serial sensor line, camera) feed a session channel,
//! a single consumer thread applies the count rules, and presentation
//! subscribers receive notifications over a broadcast bus.

pub mod config;
pub mod error;
pub mod messaging;
pub mod mode;
pub mod session;
pub mod source;
pub mod state;
