//! Error type returned by option handlers and the dispatch engine.

use crate::config::ConfigError;
use crate::device::DeviceError;
use crate::range::RangeError;
use crate::settings::SettingsError;

/// Everything that can stop the option pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad or missing flags; raised before any handler runs.
    #[error("{0}")]
    Usage(String),

    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    #[error("Please specify a model")]
    MustSpecifyModel,

    #[error("Unknown port '{0}'")]
    UnknownPort(String),

    #[error("Unsupported operation: {0}")]
    NotSupported(String),

    #[error("Bad parameters: {0}")]
    BadParameters(String),

    #[error("Invalid range: {0}")]
    BadRange(#[from] RangeError),

    #[error("Operation cancelled")]
    Cancelled,

    /// The camera was released by an abort while a handler still needed it.
    #[error("Camera has been released")]
    DeviceReleased,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("Can not save file as {path}: {source}")]
    Save {
        path: String,
        source: std::io::Error,
    },

    #[error("I/O problem: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CliError {
    /// Whether this error means the user asked to stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            CliError::Cancelled | CliError::Device(DeviceError::Cancelled)
        )
    }
}
