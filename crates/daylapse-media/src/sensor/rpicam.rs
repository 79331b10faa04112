//! Sensor backend driving `rpicam-still` (or a compatible program).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use daylapse_models::Resolution;
use tokio::process::Command;
use tracing::{debug, info};

use super::{check_sensor_program, ExposureSettings, StillSensor};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Default still-capture program.
pub const DEFAULT_PROGRAM: &str = "rpicam-still";

/// Still sensor backed by a command-line capture program.
///
/// Each grab runs the program once and decodes the PNG it writes to stdout.
pub struct RpicamSensor {
    program: String,
    resolution: Option<Resolution>,
    /// Settle time handed to the program via `-t` for metering
    metering_ms: u64,
    /// Warm-up pause after opening
    warmup: Duration,
    timeout_secs: u64,
}

impl Default for RpicamSensor {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl RpicamSensor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            resolution: None,
            metering_ms: 1000,
            warmup: Duration::from_secs(2),
            timeout_secs: 60,
        }
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn resolution(&self) -> MediaResult<Resolution> {
        self.resolution.ok_or(MediaError::NotInitialized)
    }

    /// Arguments for a single still written as PNG to stdout.
    pub fn grab_args(resolution: Resolution, exposure: &ExposureSettings) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            "--immediate".to_string(),
            "--width".to_string(),
            resolution.width.to_string(),
            "--height".to_string(),
            resolution.height.to_string(),
            "--encoding".to_string(),
            "png".to_string(),
        ];

        if let Some(shutter) = exposure.shutter {
            args.push("--shutter".to_string());
            args.push(shutter.as_micros().to_string());
        }
        if let Some(gain) = exposure.analogue_gain {
            args.push("--gain".to_string());
            args.push(format!("{:.2}", gain));
        }
        if let Some((red, blue)) = exposure.awb_gains {
            args.push("--awbgains".to_string());
            args.push(format!("{:.2},{:.2}", red, blue));
        }

        args.push("-o".to_string());
        args.push("-".to_string());
        args
    }

    /// Arguments for an auto-exposure run that only reports metadata.
    pub fn metering_args(resolution: Resolution, settle_ms: u64) -> Vec<String> {
        vec![
            "-n".to_string(),
            "-t".to_string(),
            settle_ms.to_string(),
            "--width".to_string(),
            resolution.width.to_string(),
            "--height".to_string(),
            resolution.height.to_string(),
            "--metadata".to_string(),
            "-".to_string(),
            "--metadata-format".to_string(),
            "json".to_string(),
            "-o".to_string(),
            "/dev/null".to_string(),
        ]
    }

    /// Run the capture program and return its stdout.
    async fn run(&self, args: &[String]) -> MediaResult<Vec<u8>> {
        debug!("Running {} {}", self.program, args.join(" "));

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| MediaError::Timeout(self.timeout_secs))??;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(MediaError::command_failed(
                format!("{} exited with non-zero status", self.program),
                (!stderr.is_empty()).then_some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Extract the exposure time from capture metadata JSON.
pub fn parse_exposure_time(metadata: &[u8]) -> MediaResult<Duration> {
    let value: serde_json::Value = serde_json::from_slice(metadata)?;
    value
        .get("ExposureTime")
        .and_then(|v| v.as_u64())
        .map(Duration::from_micros)
        .ok_or_else(|| MediaError::capture("metadata has no ExposureTime"))
}

#[async_trait]
impl StillSensor for RpicamSensor {
    fn name(&self) -> &str {
        &self.program
    }

    async fn open(&mut self, resolution: Resolution) -> MediaResult<()> {
        let path = check_sensor_program(&self.program)?;
        info!("Opening {} ({}) at {}", self.program, path.display(), resolution);

        self.resolution = Some(resolution);
        if !self.warmup.is_zero() {
            tokio::time::sleep(self.warmup).await;
        }
        Ok(())
    }

    async fn grab(&mut self, exposure: &ExposureSettings) -> MediaResult<Frame> {
        let args = Self::grab_args(self.resolution()?, exposure);
        let png = self
            .run(&args)
            .await
            .map_err(|e| MediaError::capture(e.to_string()))?;
        Frame::decode(&png)
    }

    async fn metered_exposure(&mut self) -> MediaResult<Duration> {
        let args = Self::metering_args(self.resolution()?, self.metering_ms);
        let metadata = self.run(&args).await?;
        parse_exposure_time(&metadata)
    }

    async fn close(&mut self) -> MediaResult<()> {
        if self.resolution.take().is_some() {
            info!("Closed {}", self.program);
        }
        Ok(())
    }
}
