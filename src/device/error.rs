//! Error type reported by camera drivers.

/// Errors raised by a driver or a bound camera.
///
/// These are passed through the dispatch engine unchanged, so the display
/// text is what the user sees in the final error report.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Bad parameters: {0}")]
    BadParameters(String),

    #[error("Unsupported operation")]
    NotSupported,

    #[error("File '{0}' not found")]
    FileNotFound(String),

    #[error("Directory '{0}' not found")]
    DirectoryNotFound(String),

    #[error("Directory '{0}' already exists")]
    DirectoryExists(String),

    #[error("Unknown port '{0}'")]
    UnknownPort(String),

    #[error("Cancelled operation")]
    Cancelled,

    #[error("I/O problem: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transfer failed: {0}")]
    Transfer(String),
}
