//! Recorder configuration.
//!
//! Recording settings come from a JSON file; process-level knobs (where the
//! settings and the session log live, console log format, metrics port)
//! come from environment variables and the command line.

use std::path::{Path, PathBuf};

use daylapse_media::{CameraKind, FusionConfig, SensorSource};
use daylapse_models::{DaylightWindow, ImageTemplate, ReportKey, Resolution};
use serde::Deserialize;

use crate::error::{RecorderError, RecorderResult};

/// Default settings file.
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";
/// Default session log file.
pub const DEFAULT_LOG_FILE: &str = "auto_record.log";

/// Longest accepted interval between frames.
const MAX_FRAME_PERIOD_SECS: f64 = 86_400.0;
/// Longest accepted dawn or dusk buffer.
const MAX_BUFFER_MINUTES: f64 = 24.0 * 60.0;
/// Local hours a fixed window may span, covering windows across midnight.
const FIXED_WINDOW_HOURS: std::ops::RangeInclusive<f64> = -24.0..=48.0;

/// Recording settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Output frame width
    pub width: u32,
    /// Output frame height
    pub height: u32,
    /// Frame rate of the assembled video
    pub frame_rate: f64,
    /// Real seconds represented by one second of video
    pub time_scale: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub dawn_buffer_minutes: f64,
    pub dusk_buffer_minutes: f64,
    /// Frame filename with one `%d` placeholder
    pub image_template: ImageTemplate,
    pub log_format: String,
    pub create_video_command: String,
    pub upload_video_command: String,
    pub report_file: PathBuf,
    /// Free-text camera identity written to the report
    pub device: String,

    /// Report lines to write, in order (defaults to all)
    #[serde(default)]
    pub report_keys: Option<Vec<String>>,
    /// Extra attempts for a failed capture before the session ends
    #[serde(default)]
    pub capture_retries: u32,
    /// Capture strategy bound to the sensor
    #[serde(default)]
    pub capture_mode: CameraKind,
    /// Sensor backend (defaults to the still-capture program)
    #[serde(default)]
    pub sensor: SensorSource,
    /// Resolution requested from the sensor (defaults to the output resolution)
    #[serde(default)]
    pub capture_resolution: Option<Resolution>,
    /// Fixed local-hour window replacing the solar calculation
    #[serde(default)]
    pub fixed_window: Option<DaylightWindow>,
    #[serde(default)]
    pub fusion: FusionConfig,
}

impl Settings {
    /// Load settings from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> RecorderResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            RecorderError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate settings.
    pub fn from_json(json: &str) -> RecorderResult<Self> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| RecorderError::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges.
    pub fn validate(&self) -> RecorderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RecorderError::config(format!(
                "resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.frame_rate > 0.0) {
            return Err(RecorderError::config("frameRate must be positive"));
        }
        if !(self.time_scale > 0.0) {
            return Err(RecorderError::config("timeScale must be positive"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RecorderError::config(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(RecorderError::config(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        let period = self.frame_period_secs();
        if !(period.is_finite() && period > 0.0 && period <= MAX_FRAME_PERIOD_SECS) {
            return Err(RecorderError::config(format!(
                "frame period timeScale/frameRate = {} seconds is out of range",
                period
            )));
        }
        for (name, minutes) in [
            ("dawnBufferMinutes", self.dawn_buffer_minutes),
            ("duskBufferMinutes", self.dusk_buffer_minutes),
        ] {
            if !(0.0..=MAX_BUFFER_MINUTES).contains(&minutes) {
                return Err(RecorderError::config(format!(
                    "{} must be within 0..={}, got {}",
                    name, MAX_BUFFER_MINUTES, minutes
                )));
            }
        }
        if let Some(window) = self.fixed_window {
            let hours = FIXED_WINDOW_HOURS;
            if !hours.contains(&window.start_hour) || !hours.contains(&window.end_hour) {
                return Err(RecorderError::config(format!(
                    "fixedWindow hours must be within {}..={}",
                    hours.start(),
                    hours.end()
                )));
            }
            if window.end_hour < window.start_hour {
                return Err(RecorderError::config("fixedWindow ends before it starts"));
            }
        }
        if self.fusion.brackets.is_empty() {
            return Err(RecorderError::config("fusion.brackets must not be empty"));
        }
        Ok(())
    }

    pub fn output_resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn sensor_resolution(&self) -> Resolution {
        self.capture_resolution
            .unwrap_or_else(|| self.output_resolution())
    }

    /// Seconds of real time between captures.
    pub fn frame_period_secs(&self) -> f64 {
        self.time_scale / self.frame_rate
    }

    /// Configured report keys, unknown names dropped.
    pub fn report_keys(&self) -> Vec<ReportKey> {
        match &self.report_keys {
            Some(names) => ReportKey::parse_list(names),
            None => ReportKey::ALL.to_vec(),
        }
    }
}

/// Process-level configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Settings file path
    pub settings_path: PathBuf,
    /// Session log file path
    pub log_file: PathBuf,
    /// Emit console logs as JSON
    pub json_logs: bool,
    /// Port for the Prometheus listener, if enabled
    pub metrics_port: Option<u16>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            json_logs: false,
            metrics_port: None,
        }
    }
}

impl RuntimeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            settings_path: std::env::var("DAYLAPSE_SETTINGS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH)),
            log_file: std::env::var("DAYLAPSE_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_FILE)),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Apply command-line arguments; the first one is the settings path.
    pub fn with_args<I: IntoIterator<Item = String>>(mut self, args: I) -> Self {
        if let Some(path) = args.into_iter().next() {
            self.settings_path = PathBuf::from(path);
        }
        self
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Minimal valid settings document.
    pub fn settings_json(template: &str) -> String {
        format!(
            r#"{{
                "width": 8,
                "height": 6,
                "frameRate": 1,
                "timeScale": 60,
                "latitude": 52.52,
                "longitude": 13.405,
                "dawnBufferMinutes": 0,
                "duskBufferMinutes": 0,
                "imageTemplate": "{}",
                "logFormat": "{{time}} {{message}}",
                "createVideoCommand": "true",
                "uploadVideoCommand": "true",
                "reportFile": "report.txt",
                "device": "Test rig"
            }}"#,
            template
        )
    }
}
