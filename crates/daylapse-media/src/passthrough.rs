//! Single-exposure camera.

use async_trait::async_trait;
use daylapse_models::Resolution;
use tracing::debug;

use crate::camera::{CameraDevice, DeviceState};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::sensor::{ExposureSettings, StillSensor};

/// One automatic exposure per capture, returned at the sensor's resolution.
pub struct PassthroughCamera {
    sensor: Box<dyn StillSensor>,
    state: DeviceState,
}

impl PassthroughCamera {
    pub const IMPLEMENTATION: &'static str = "Single exposure";

    pub fn new(sensor: Box<dyn StillSensor>) -> Self {
        Self {
            sensor,
            state: DeviceState::Created,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }
}

#[async_trait]
impl CameraDevice for PassthroughCamera {
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
        self.sensor.open(resolution).await.map_err(|e| match e {
            MediaError::SensorNotFound(_) => e,
            other => MediaError::device_init(other.to_string()),
        })?;
        self.state = DeviceState::Ready;
        Ok(())
    }

    async fn capture(&mut self) -> MediaResult<Frame> {
        self.state.ensure_ready()?;
        let frame = self.sensor.grab(&ExposureSettings::auto()).await?;
        debug!("Captured {} frame", frame.resolution());
        Ok(frame)
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
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    /// Scripted sensor recording every grab.
    #[derive(Clone, Default)]
    pub struct FakeSensor {
        pub grabs: Arc<Mutex<Vec<ExposureSettings>>>,
        pub closes: Arc<AtomicUsize>,
        pub metered: Duration,
        /// Zero-based grab number that fails
        pub fail_on: Option<usize>,
        pub resolution: Option<Resolution>,
        /// Sensor without automatic exposure readback
        pub no_metering: bool,
    }

    impl FakeSensor {
        pub fn metering(metered: Duration) -> Self {
            Self {
                metered,
                ..Default::default()
            }
        }

        pub fn grab_count(&self) -> usize {
            self.grabs.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StillSensor for FakeSensor {
        fn name(&self) -> &str {
            "fake-sensor"
        }

        async fn open(&mut self, resolution: Resolution) -> MediaResult<()> {
            self.resolution = Some(resolution);
            Ok(())
        }

        async fn grab(&mut self, exposure: &ExposureSettings) -> MediaResult<Frame> {
            let resolution = self.resolution.ok_or(MediaError::NotInitialized)?;
            let mut grabs = self.grabs.lock().unwrap();
            if self.fail_on == Some(grabs.len()) {
                return Err(MediaError::capture("sensor timeout"));
            }
            grabs.push(*exposure);

            // Brighter image for longer shutter times
            let level = exposure
                .shutter
                .map(|s| (s.as_micros() as f64 / 500.0).log2() * 30.0 + 40.0)
                .unwrap_or(128.0)
                .clamp(0.0, 255.0) as u8;
            Ok(Frame::filled(resolution, [level, level, level]))
        }

        async fn metered_exposure(&mut self) -> MediaResult<Duration> {
            if self.no_metering {
                return Err(MediaError::capture("metering unavailable"));
            }
            Ok(self.metered)
        }

        fn supports_metering(&self) -> bool {
            !self.no_metering
        }

        async fn close(&mut self) -> MediaResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
