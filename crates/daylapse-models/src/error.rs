//! Error types for model validation.

use thiserror::Error;

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or parsing model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid image template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Unknown exposure bracket: {0}")]
    UnknownBracket(String),
}

impl ModelError {
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
