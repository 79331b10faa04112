//! Error types for camera and image operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while driving the camera or processing frames.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Capture program not found in PATH: {0}")]
    SensorNotFound(String),

    #[error("Device initialization failed: {0}")]
    DeviceInit(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Device is not initialized")]
    NotInitialized,

    #[error("Device has been shut down")]
    ShutDown,

    #[error("Capture command failed: {message}")]
    CommandFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Capture command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Exposure fusion failed: {0}")]
    Fusion(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn device_init(message: impl Into<String>) -> Self {
        Self::DeviceInit(message.into())
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    pub fn fusion(message: impl Into<String>) -> Self {
        Self::Fusion(message.into())
    }

    pub fn command_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::CommandFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for errors raised while bringing the device up.
    pub fn is_init_error(&self) -> bool {
        matches!(self, MediaError::DeviceInit(_) | MediaError::SensorNotFound(_))
    }
}
