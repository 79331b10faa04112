//! Still-capture backends.
//!
//! A `StillSensor` is the hardware-facing capability the camera variants
//! are built on: it grabs one decoded frame at given exposure settings and
//! can meter the scene with automatic exposure. The default backend drives
//! an external still-capture program; USB webcams are available with the
//! `webcam` feature.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use daylapse_models::{ExposurePreset, Resolution};
use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

mod rpicam;
#[cfg(feature = "webcam")]
mod webcam;

pub use rpicam::{RpicamSensor, DEFAULT_PROGRAM};
#[cfg(feature = "webcam")]
pub use webcam::WebcamSensor;

/// Exposure settings for a single grab. `None` fields are left automatic.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExposureSettings {
    pub shutter: Option<Duration>,
    pub awb_gains: Option<(f32, f32)>,
    pub analogue_gain: Option<f32>,
}

impl ExposureSettings {
    /// Fully automatic exposure.
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn is_manual(&self) -> bool {
        self.shutter.is_some()
    }
}

impl From<ExposurePreset> for ExposureSettings {
    fn from(preset: ExposurePreset) -> Self {
        Self {
            shutter: Some(preset.shutter()),
            awb_gains: Some(preset.awb_gains),
            analogue_gain: Some(1.0),
        }
    }
}

/// Hardware capture capability used by the camera variants.
#[async_trait]
pub trait StillSensor: Send + Sync {
    /// Identity of the sensor for logs and reports.
    fn name(&self) -> &str;

    /// Prepare the sensor for capturing at the given resolution.
    async fn open(&mut self, resolution: Resolution) -> MediaResult<()>;

    /// Capture one frame with the given exposure settings.
    async fn grab(&mut self, exposure: &ExposureSettings) -> MediaResult<Frame>;

    /// Let automatic exposure settle and report the exposure time it chose.
    async fn metered_exposure(&mut self) -> MediaResult<Duration>;

    /// Whether `metered_exposure` is available on this sensor.
    fn supports_metering(&self) -> bool {
        true
    }

    /// Release the sensor.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Which sensor backend to drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SensorSource {
    /// External still-capture program
    Rpicam {
        #[serde(default = "default_program")]
        command: String,
    },
    /// USB webcam at a device index
    Webcam {
        #[serde(default)]
        index: u32,
    },
}

impl Default for SensorSource {
    fn default() -> Self {
        SensorSource::Rpicam {
            command: default_program(),
        }
    }
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

/// Build the sensor backend for a source.
pub fn create_sensor(source: &SensorSource) -> MediaResult<Box<dyn StillSensor>> {
    match source {
        SensorSource::Rpicam { command } => Ok(Box::new(RpicamSensor::new(command.clone()))),
        #[cfg(feature = "webcam")]
        SensorSource::Webcam { index } => Ok(Box::new(WebcamSensor::new(*index))),
        #[cfg(not(feature = "webcam"))]
        SensorSource::Webcam { index } => Err(MediaError::device_init(format!(
            "webcam {} requested but built without the webcam feature",
            index
        ))),
    }
}

/// Check that a capture program is available.
pub fn check_sensor_program(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::SensorNotFound(program.to_string()))
}
