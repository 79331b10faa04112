//! Recorder error types.

use daylapse_media::MediaError;
use daylapse_models::ModelError;
use thiserror::Error;

pub type RecorderResult<T> = Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device initialization failed: {0}")]
    DeviceInit(#[source] MediaError),

    #[error("Capture failed: {0}")]
    Capture(#[source] MediaError),

    #[error("Failed to persist frame: {0}")]
    Persist(#[source] MediaError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecorderError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for errors raised before any hardware is touched.
    pub fn is_config_error(&self) -> bool {
        matches!(self, RecorderError::Config(_) | RecorderError::Model(_))
    }

    /// True for errors that ended a running recording session.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            RecorderError::Capture(_) | RecorderError::Persist(_) | RecorderError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RecorderError::config("missing width").is_config_error());
        assert!(RecorderError::Capture(MediaError::capture("x")).is_session_error());
        assert!(!RecorderError::DeviceInit(MediaError::device_init("x")).is_session_error());
    }
}
