//! Prometheus metrics for recording sessions.

use std::net::SocketAddr;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{RecorderError, RecorderResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_CAPTURED_TOTAL: &str = "daylapse_frames_captured_total";
    pub const CAPTURE_FAILURES_TOTAL: &str = "daylapse_capture_failures_total";
    pub const CAPTURE_DURATION_SECONDS: &str = "daylapse_capture_duration_seconds";
    pub const SESSION_ACTIVE: &str = "daylapse_session_active";
    pub const COMMANDS_FAILED_TOTAL: &str = "daylapse_commands_failed_total";
}

/// Start the Prometheus scrape listener on `port`.
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(port: u16) -> RecorderResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| RecorderError::internal(format!("metrics exporter: {}", e)))
}

/// Record a persisted frame.
pub fn record_frame(implementation: &str, duration_secs: f64) {
    let labels = [("implementation", implementation.to_string())];
    counter!(names::FRAMES_CAPTURED_TOTAL, &labels).increment(1);
    histogram!(names::CAPTURE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a failed capture attempt.
pub fn record_capture_failure(implementation: &str) {
    let labels = [("implementation", implementation.to_string())];
    counter!(names::CAPTURE_FAILURES_TOTAL, &labels).increment(1);
}

pub fn set_session_active(active: bool) {
    gauge!(names::SESSION_ACTIVE).set(if active { 1.0 } else { 0.0 });
}

/// Record a post-recording command that failed.
pub fn record_command_failure(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::COMMANDS_FAILED_TOTAL, &labels).increment(1);
}
