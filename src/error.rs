use thiserror::Error;

/// Domain errors using thiserror for structured error handling.
///
/// Hardware failures never cross the channel to the consumer as errors; they
/// are contained in their source and surfaced as status events. These types
/// exist for the synchronous edges (open, write, config I/O).

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("Failed to open serial port {port}")]
    OpenFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Failed to write to serial port")]
    WriteFailed(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera {index}")]
    OpenFailed {
        index: u32,
        #[source]
        source: nokhwa::NokhwaError,
    },

    #[error("Failed to start stream on camera {index}")]
    StreamFailed {
        index: u32,
        #[source]
        source: nokhwa::NokhwaError,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
