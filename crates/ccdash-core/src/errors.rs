//! Payload decoding errors.

use thiserror::Error;

/// Reasons an inbound hook payload is rejected before it reaches the store.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The body is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// The body is JSON but not an object with the expected field types.
    #[error("Invalid payload: {0}")]
    InvalidShape(#[source] serde_json::Error),
    /// A mandatory field is absent or empty.
    #[error("Missing session_id or hook_event_name")]
    MissingField(&'static str),
}

impl PayloadError {
    /// Name of the missing mandatory field, if that is the failure.
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) => Some(field),
            Self::InvalidJson(_) | Self::InvalidShape(_) => None,
        }
    }
}
