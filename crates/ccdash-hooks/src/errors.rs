//! Hook installer error types.

use thiserror::Error;

/// Errors from reading or patching the agent settings file.
#[derive(Debug, Error)]
pub enum HooksError {
    /// I/O error reading, copying, or writing the settings file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The settings file parsed but has an unexpected structure.
    #[error("Unexpected settings shape: {0}")]
    InvalidShape(String),
}

/// Convenience result type for hook installer operations.
pub type Result<T> = std::result::Result<T, HooksError>;
