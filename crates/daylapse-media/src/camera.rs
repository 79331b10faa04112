//! Camera device capability and variant selection.
//!
//! The scheduler only ever talks to `dyn CameraDevice`; which variant is
//! bound is decided once per session from configuration.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use daylapse_models::Resolution;
use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::fusion::{FusionCamera, FusionConfig};
use crate::passthrough::PassthroughCamera;
use crate::sensor::StillSensor;

/// Lifecycle of a camera device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Created,
    Ready,
    ShutDown,
}

impl DeviceState {
    /// Error for a capture attempted outside `Ready`.
    pub fn ensure_ready(self) -> MediaResult<()> {
        match self {
            DeviceState::Ready => Ok(()),
            DeviceState::Created => Err(MediaError::NotInitialized),
            DeviceState::ShutDown => Err(MediaError::ShutDown),
        }
    }
}

/// A camera that produces one finished frame per capture.
///
/// `capture` is only valid between a successful `init` and `shutdown`.
#[async_trait]
pub trait CameraDevice: Send {
    /// Device identity (which sensor is driven).
    fn name(&self) -> &str;

    /// Human-readable name of the capture strategy.
    fn implementation(&self) -> &'static str;

    async fn init(&mut self, resolution: Resolution) -> MediaResult<()>;

    /// Capture one frame. Blocking on the hardware can take seconds.
    async fn capture(&mut self) -> MediaResult<Frame>;

    async fn shutdown(&mut self) -> MediaResult<()>;
}

/// Configured capture strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    /// One exposure per frame
    #[default]
    Passthrough,
    /// Bracketed exposures merged with exposure fusion
    #[serde(alias = "hdr")]
    Fusion,
}

impl CameraKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraKind::Passthrough => "passthrough",
            CameraKind::Fusion => "fusion",
        }
    }
}

impl fmt::Display for CameraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passthrough" => Ok(CameraKind::Passthrough),
            "fusion" | "hdr" => Ok(CameraKind::Fusion),
            other => Err(format!("unknown capture mode '{}'", other)),
        }
    }
}

/// Bind a camera variant to a sensor.
pub fn create_camera(
    kind: CameraKind,
    sensor: Box<dyn StillSensor>,
    fusion: FusionConfig,
) -> Box<dyn CameraDevice> {
    match kind {
        CameraKind::Passthrough => Box::new(PassthroughCamera::new(sensor)),
        CameraKind::Fusion => Box::new(FusionCamera::new(sensor, fusion)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::RpicamSensor;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("passthrough".parse::<CameraKind>().unwrap(), CameraKind::Passthrough);
        assert_eq!("HDR".parse::<CameraKind>().unwrap(), CameraKind::Fusion);
        assert!("thermal".parse::<CameraKind>().is_err());

        let kind: CameraKind = serde_json::from_str("\"hdr\"").unwrap();
        assert_eq!(kind, CameraKind::Fusion);
    }

    #[test]
    fn test_factory_binds_variant() {
        let camera = create_camera(
            CameraKind::Fusion,
            Box::new(RpicamSensor::default()),
            FusionConfig::default(),
        );
        assert_eq!(camera.name(), "rpicam-still");
        assert_eq!(camera.implementation(), FusionCamera::IMPLEMENTATION);
    }

    #[test]
    fn test_state_guards_capture() {
        assert!(DeviceState::Ready.ensure_ready().is_ok());
        assert!(matches!(
            DeviceState::Created.ensure_ready(),
            Err(MediaError::NotInitialized)
        ));
        assert!(matches!(
            DeviceState::ShutDown.ensure_ready(),
            Err(MediaError::ShutDown)
        ));
    }
}
