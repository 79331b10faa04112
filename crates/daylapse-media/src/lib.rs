//! Camera capture and frame processing for the daylapse recorder.
//!
//! This crate provides:
//! - The `CameraDevice` capability trait and its two variants
//!   (single-exposure passthrough and multi-exposure fusion)
//! - The `StillSensor` capture backends: a still-capture program, or a USB
//!   webcam with the `webcam` feature
//! - Mertens-style exposure fusion
//! - Scale-and-crop shaping of captured frames to the output resolution

pub mod adapter;
pub mod camera;
pub mod error;
pub mod frame;
pub mod fusion;
pub mod passthrough;
pub mod sensor;

pub use adapter::FrameAdapter;
pub use camera::{create_camera, CameraDevice, CameraKind, DeviceState};
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use fusion::{merge_mertens, FusionCamera, FusionConfig, FusionWeights};
pub use passthrough::PassthroughCamera;
pub use sensor::{
    check_sensor_program, create_sensor, ExposureSettings, RpicamSensor, SensorSource,
    StillSensor,
};
#[cfg(feature = "webcam")]
pub use sensor::WebcamSensor;
