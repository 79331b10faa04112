//! Shared data models for the daylapse recorder.
//!
//! This crate provides plain, Serde-serializable types for:
//! - Output resolution and daylight windows
//! - Exposure bracket presets used by multi-exposure capture
//! - Frame filename templates
//! - Session report keys

pub mod error;
pub mod exposure;
pub mod report;
pub mod resolution;
pub mod template;
pub mod window;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use exposure::{ExposureBracket, ExposurePreset};
pub use report::ReportKey;
pub use resolution::Resolution;
pub use template::ImageTemplate;
pub use window::DaylightWindow;
