//! Multi-exposure capture merged with exposure fusion.
//!
//! Each capture optionally meters the scene with automatic exposure, then
//! grabs a fixed sequence of bracketed exposures and fuses them on the
//! blocking thread pool. Any failed bracket aborts the whole capture.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use daylapse_models::{ExposureBracket, Resolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::camera::{CameraDevice, DeviceState};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::sensor::{ExposureSettings, StillSensor};

mod mertens;
mod pyramid;

pub use mertens::{merge_mertens, FusionWeights};

/// Default metered exposure below which the scene counts as bright.
pub const DEFAULT_BRIGHT_THRESHOLD_US: u64 = 10_000;

/// Bracket selection and fusion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FusionConfig {
    /// Meter the scene before each bracket sequence
    pub meter_brightness: bool,
    /// Metered exposure (µs) shorter than this means "too bright"
    pub bright_threshold_us: u64,
    /// Bracket sequence captured when the scene is not too bright
    pub brackets: Vec<ExposureBracket>,
    pub weights: FusionWeights,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            meter_brightness: true,
            bright_threshold_us: DEFAULT_BRIGHT_THRESHOLD_US,
            brackets: ExposureBracket::ALL.to_vec(),
            weights: FusionWeights::default(),
        }
    }
}

impl FusionConfig {
    pub fn bright_threshold(&self) -> Duration {
        Duration::from_micros(self.bright_threshold_us)
    }

    /// Brackets for one capture; bright scenes drop the long exposures.
    pub fn select_brackets(&self, too_bright: bool) -> Vec<ExposureBracket> {
        self.brackets
            .iter()
            .copied()
            .filter(|bracket| !(too_bright && bracket.is_dark_bracket()))
            .collect()
    }
}

/// Camera that fuses bracketed exposures into one frame.
pub struct FusionCamera {
    sensor: Box<dyn StillSensor>,
    config: FusionConfig,
    state: DeviceState,
}

impl FusionCamera {
    pub const IMPLEMENTATION: &'static str = "Multi-exposure fusion";

    pub fn new(sensor: Box<dyn StillSensor>, config: FusionConfig) -> Self {
        Self {
            sensor,
            config,
            state: DeviceState::Created,
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Meter with automatic exposure and compare against the threshold.
    async fn scene_too_bright(&mut self) -> MediaResult<bool> {
        let metered = self.sensor.metered_exposure().await?;
        let too_bright = metered < self.config.bright_threshold();
        debug!(
            "Metered exposure {:?} (threshold {:?}), too bright: {}",
            metered,
            self.config.bright_threshold(),
            too_bright
        );
        Ok(too_bright)
    }
}

#[async_trait]
impl CameraDevice for FusionCamera {
    fn name(&self) -> &str {
        self.sensor.name()
    }

    fn implementation(&self) -> &'static str {
        Self::IMPLEMENTATION
    }

    async fn init(&mut self, resolution: Resolution) -> MediaResult<()> {
        if self.state == DeviceState::ShutDown {
            return Err(MediaError::ShutDown);
        }
        if self.config.brackets.is_empty() {
            return Err(MediaError::device_init("no exposure brackets configured"));
        }
        self.sensor.open(resolution).await.map_err(|e| match e {
            MediaError::SensorNotFound(_) => e,
            other => MediaError::device_init(other.to_string()),
        })?;
        self.state = DeviceState::Ready;
        info!(
            "Fusion camera ready with brackets {:?}",
            self.config.brackets
        );
        Ok(())
    }

    async fn capture(&mut self) -> MediaResult<Frame> {
        self.state.ensure_ready()?;

        let too_bright = if self.config.meter_brightness && self.sensor.supports_metering() {
            self.scene_too_bright()
                .await
                .map_err(|e| MediaError::capture(format!("brightness metering failed: {}", e)))?
        } else {
            false
        };

        let brackets = self.config.select_brackets(too_bright);
        if brackets.is_empty() {
            return Err(MediaError::capture("no brackets left after brightness metering"));
        }

        let mut exposures = Vec::with_capacity(brackets.len());
        for bracket in &brackets {
            let settings = ExposureSettings::from(bracket.preset());
            let frame = self.sensor.grab(&settings).await.map_err(|e| {
                MediaError::capture(format!("{} bracket failed: {}", bracket, e))
            })?;
            exposures.push(frame);
        }

        // The worker owns the bracket frames until the fused frame comes back
        let weights = self.config.weights;
        let started = Instant::now();
        let fused = tokio::task::spawn_blocking(move || merge_mertens(&exposures, &weights))
            .await
            .map_err(|e| MediaError::fusion(format!("fusion worker failed: {}", e)))??;

        debug!(
            "Fused {} brackets in {:?}",
            brackets.len(),
            started.elapsed()
        );
        Ok(fused)
    }

    async fn shutdown(&mut self) -> MediaResult<()> {
        if self.state == DeviceState::ShutDown {
            return Ok(());
        }
        self.state = DeviceState::ShutDown;
        self.sensor.close().await
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::passthrough::test_support::FakeSensor;

    fn camera_with(sensor: &FakeSensor) -> FusionCamera {
        FusionCamera::new(Box::new(sensor.clone()), FusionConfig::default())
    }

    #[tokio::test]
    async fn test_bright_scene_captures_three_brackets() {
        let sensor = FakeSensor::metering(Duration::from_micros(800));
        let mut camera = camera_with(&sensor);
        camera.init(Resolution::new(16, 12)).await.unwrap();

        let frame = assert_ok!(camera.capture().await);

        assert_eq!(frame.resolution(), Resolution::new(16, 12));
        let shutters: Vec<_> = sensor
            .grabs
            .lock()
            .unwrap()
            .iter()
            .map(|g| g.shutter.unwrap())
            .collect();
        let expected: Vec<_> = ExposureBracket::BRIGHT
            .iter()
            .map(|b| b.preset().shutter())
            .collect();
        assert_eq!(shutters, expected);
    }

    #[tokio::test]
    async fn test_dim_scene_captures_five_brackets() {
        let sensor = FakeSensor::metering(Duration::from_millis(40));
        let mut camera = camera_with(&sensor);
        camera.init(Resolution::new(16, 12)).await.unwrap();

        camera.capture().await.unwrap();

        assert_eq!(sensor.grab_count(), 5);
    }

    #[tokio::test]
    async fn test_metering_disabled_captures_full_set() {
        let sensor = FakeSensor::metering(Duration::from_micros(100));
        let config = FusionConfig {
            meter_brightness: false,
            ..Default::default()
        };
        let mut camera = FusionCamera::new(Box::new(sensor.clone()), config);
        camera.init(Resolution::new(8, 8)).await.unwrap();

        camera.capture().await.unwrap();

        assert_eq!(sensor.grab_count(), 5);
    }

    #[tokio::test]
    async fn test_sensor_without_metering_captures_full_set() {
        let sensor = FakeSensor {
            no_metering: true,
            ..Default::default()
        };
        let mut camera = camera_with(&sensor);
        assert_ok!(camera.init(Resolution::new(8, 8)).await);

        assert_ok!(camera.capture().await);

        assert_eq!(sensor.grab_count(), 5);
    }

    #[tokio::test]
    async fn test_failed_bracket_aborts_capture() {
        let sensor = FakeSensor {
            metered: Duration::from_millis(40),
            fail_on: Some(2),
            ..Default::default()
        };
        let mut camera = camera_with(&sensor);
        camera.init(Resolution::new(8, 8)).await.unwrap();

        let err = assert_err!(camera.capture().await);

        assert!(matches!(err, MediaError::Capture(ref msg) if msg.contains("medium")));
        assert_eq!(sensor.grab_count(), 2);
    }

    #[test]
    fn test_select_brackets() {
        let config = FusionConfig::default();
        assert_eq!(config.select_brackets(true), ExposureBracket::BRIGHT.to_vec());
        assert_eq!(config.select_brackets(false), ExposureBracket::ALL.to_vec());
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: FusionConfig =
            serde_json::from_str(r#"{"brightThresholdUs": 2500}"#).unwrap();
        assert_eq!(config.bright_threshold(), Duration::from_micros(2500));
        assert!(config.meter_brightness);
        assert_eq!(config.brackets.len(), 5);
    }
}
