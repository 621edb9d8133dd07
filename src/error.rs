// Failures on the host-facing surface: config parsing, property and event
// names, writes to read-only properties.
// Visibility decisions themselves are infallible.

use thiserror::Error;

use crate::types::PlayerProperty;

/// Controls engine error types.
#[derive(Error, Debug)]
pub enum ControlsError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown player property: {0}")]
    UnknownProperty(String),

    #[error("Unknown activity event: {0}")]
    UnknownActivity(String),

    #[error("Property {0} can only be written through dispatch")]
    ReadOnlyProperty(PlayerProperty),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ControlsError {
    fn from(err: serde_json::Error) -> Self {
        ControlsError::Serialization(err.to_string())
    }
}
