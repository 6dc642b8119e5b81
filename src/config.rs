use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::state::Mode;

/// Upper bound on the source poll interval. Anything slower makes sensor
/// input visibly laggy on the overlay.
pub const MAX_POLL_INTERVAL_MS: u64 = 50;

fn default_serial_port() -> String {
    if cfg!(windows) {
        "COM10".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Serial port the sensor device is attached to
    pub serial_port: String,

    /// Serial baud rate
    pub baud_rate: u32,

    /// Camera device index for the live feed
    pub camera_index: u32,

    /// Source poll interval in milliseconds (clamped to 1..=50)
    pub poll_interval_ms: u64,

    /// Mode highlighted when the selection screen opens
    #[serde(default)]
    pub initial_mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial_port: default_serial_port(),
            baud_rate: 9600,
            camera_index: 1,
            poll_interval_ms: 10,
            initial_mode: Mode::PitchCount,
        }
    }
}

impl Config {
    /// Load configuration from the config directory next to the executable.
    /// Creates a default config if the file doesn't exist. Read once at
    /// startup; the running session never re-reads it.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).map_err(|err| ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    source: Box::new(err),
                })?;
            let config: Config =
                serde_json::from_str(&content).map_err(|err| ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    source: Box::new(err),
                })?;
            config.validate()?;
            tracing::info!("Loaded config from: {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            tracing::info!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|err| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: err,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|err| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(err),
        })?;
        fs::write(&config_path, json).map_err(|err| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(err),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial_port.is_empty() {
            return Err(ConfigError::Invalid("serial_port is empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval for source read loops, clamped to keep input latency low
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS))
    }

    /// Get the config file path (in app's base directory)
    fn config_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|err| ConfigError::LoadFailed {
            path: "<exe>".to_string(),
            source: Box::new(err),
        })?;
        let exe_dir = exe_path.parent().ok_or_else(|| {
            ConfigError::Invalid("could not determine executable directory".to_string())
        })?;

        Ok(exe_dir.join("config").join("config.json"))
    }
}
