//! Recording scheduler.
//!
//! Drives one recording session:
//! `Idle → Initializing → WaitingForDawn → Recording → Finalizing → Closed`.
//!
//! The record window is fixed once at session start. Frames are captured on
//! a drift-corrected cadence: each sleep lasts
//! `period − (elapsed mod period)` so per-cycle overhead never accumulates.
//! The camera is shut down exactly once on every exit path.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, Timelike};
use daylapse_media::{CameraDevice, Frame, FrameAdapter};
use daylapse_models::{DaylightWindow, ImageTemplate, Resolution};
use tracing::{debug, info, warn};

use crate::clock::{epoch_seconds, seconds, Clock};
use crate::config::Settings;
use crate::error::{RecorderError, RecorderResult};
use crate::logging::SessionLog;
use crate::metrics;
use crate::retry::RetryPolicy;
use crate::solar::compute_daylight_window;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Initializing,
    WaitingForDawn,
    Recording,
    Finalizing,
    Closed,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Initializing => "initializing",
            SchedulerState::WaitingForDawn => "waiting_for_dawn",
            SchedulerState::Recording => "recording",
            SchedulerState::Finalizing => "finalizing",
            SchedulerState::Closed => "closed",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the daylight window comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowSource {
    /// Approximate solar calculation for a location
    Solar { latitude: f64, longitude: f64 },
    /// Fixed local hours
    Fixed(DaylightWindow),
}

impl WindowSource {
    /// Daylight window (before buffers) for the date of `now`.
    pub fn resolve(&self, now: &DateTime<FixedOffset>) -> DaylightWindow {
        match *self {
            WindowSource::Solar {
                latitude,
                longitude,
            } => compute_daylight_window(latitude, longitude, now),
            WindowSource::Fixed(window) => window,
        }
    }
}

/// Absolute record window in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordWindow {
    pub start_epoch: f64,
    pub end_epoch: f64,
}

impl RecordWindow {
    /// Anchor a buffered window to the local midnight of `now`.
    ///
    /// A window that already ended today rolls forward by one day.
    pub fn resolve(window: &DaylightWindow, now: &DateTime<FixedOffset>) -> Self {
        let midnight = (now.timestamp() - i64::from(now.num_seconds_from_midnight())) as f64;
        let mut record = Self {
            start_epoch: midnight + 3600.0 * window.start_hour,
            end_epoch: midnight + 3600.0 * window.end_hour,
        };

        if epoch_seconds(now) > record.end_epoch {
            record.start_epoch += SECONDS_PER_DAY;
            record.end_epoch += SECONDS_PER_DAY;
        }
        record
    }

    /// Seconds to wait before recording may start (0 when already open).
    pub fn delay_from(&self, now_epoch: f64) -> f64 {
        (self.start_epoch - now_epoch).max(0.0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_epoch - self.start_epoch
    }
}

/// Counters of a running session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session {
    /// When recording actually began
    pub start_epoch: f64,
    /// When recording must stop
    pub end_epoch: f64,
    /// Index of the next frame to capture (starts at 1)
    pub frame_index: u64,
    pub running: bool,
}

impl Session {
    pub fn begin(start_epoch: f64, end_epoch: f64) -> Self {
        Self {
            start_epoch,
            end_epoch,
            frame_index: 1,
            running: true,
        }
    }

    /// Account for one persisted frame.
    pub fn advance(&mut self) {
        self.frame_index += 1;
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_index - 1
    }

    pub fn is_past_end(&self, now_epoch: f64) -> bool {
        now_epoch >= self.end_epoch
    }

    /// Sleep that lands the next capture on the ideal cadence.
    pub fn next_delay(&self, now_epoch: f64, period_secs: f64) -> f64 {
        let elapsed = (now_epoch - self.start_epoch).max(0.0);
        period_secs - elapsed % period_secs
    }
}

/// Everything the scheduler needs from configuration.
#[derive(Debug, Clone)]
pub struct RecordingPlan {
    pub window: WindowSource,
    pub dawn_buffer_minutes: f64,
    pub dusk_buffer_minutes: f64,
    /// Seconds between captures
    pub frame_period_secs: f64,
    /// Resolution requested from the camera
    pub capture_resolution: Resolution,
    pub adapter: FrameAdapter,
    pub template: ImageTemplate,
    pub retry: RetryPolicy,
}

impl RecordingPlan {
    pub fn from_settings(settings: &Settings) -> Self {
        let window = match settings.fixed_window {
            Some(window) => WindowSource::Fixed(window),
            None => WindowSource::Solar {
                latitude: settings.latitude,
                longitude: settings.longitude,
            },
        };

        Self {
            window,
            dawn_buffer_minutes: settings.dawn_buffer_minutes,
            dusk_buffer_minutes: settings.dusk_buffer_minutes,
            frame_period_secs: settings.frame_period_secs(),
            capture_resolution: settings.sensor_resolution(),
            adapter: FrameAdapter::new(Some(settings.output_resolution())),
            template: settings.image_template.clone(),
            retry: RetryPolicy::new(settings.capture_retries),
        }
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub state: SchedulerState,
    /// Buffered daylight window in local hours
    pub window: DaylightWindow,
    pub record_window: RecordWindow,
    pub started_at: DateTime<FixedOffset>,
    pub ended_at: DateTime<FixedOffset>,
    pub frames_captured: u64,
    pub next_frame_index: u64,
    /// Sensor the camera drove
    pub sensor: String,
    pub implementation: String,
}

/// Sequential capture loop bound to one camera per run.
pub struct RecordingScheduler<'a> {
    plan: RecordingPlan,
    clock: Arc<dyn Clock>,
    log: &'a SessionLog,
    state: SchedulerState,
}

impl<'a> RecordingScheduler<'a> {
    pub fn new(plan: RecordingPlan, clock: Arc<dyn Clock>, log: &'a SessionLog) -> Self {
        Self {
            plan,
            clock,
            log,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn plan(&self) -> &RecordingPlan {
        &self.plan
    }

    /// Run one session to completion.
    ///
    /// The camera is shut down before returning, whatever the outcome.
    pub async fn run(
        &mut self,
        mut camera: Box<dyn CameraDevice>,
    ) -> RecorderResult<SessionSummary> {
        self.transition(SchedulerState::Initializing);
        let resolution = self.plan.capture_resolution;
        self.event(&format!(
            "Initializing {} ({})",
            camera.name(),
            camera.implementation()
        ));

        let outcome = match camera.init(resolution).await {
            Ok(()) => {
                self.event(&format!("Resolution set to {}", resolution));
                self.event("Camera initialized");
                self.record(camera.as_mut()).await
            }
            Err(e) => Err(RecorderError::DeviceInit(e)),
        };

        self.transition(SchedulerState::Finalizing);
        if let Err(e) = camera.shutdown().await {
            warn!("Camera shutdown failed: {}", e);
        }
        metrics::set_session_active(false);
        self.transition(SchedulerState::Closed);

        let mut summary = outcome?;
        summary.state = self.state;
        Ok(summary)
    }

    async fn record(&mut self, camera: &mut dyn CameraDevice) -> RecorderResult<SessionSummary> {
        let now = self.clock.now();
        let window = self
            .plan
            .window
            .resolve(&now)
            .with_buffers(self.plan.dawn_buffer_minutes, self.plan.dusk_buffer_minutes);
        let record_window = RecordWindow::resolve(&window, &now);

        self.event(&format!(
            "Starting auto-daylight recording from {:.3} to {:.3}",
            window.start_hour, window.end_hour
        ));
        self.event(&format!(
            "Recording every {} seconds",
            self.plan.frame_period_secs
        ));

        if let Some(dir) = self.plan.template.output_dir() {
            let is_dir = tokio::fs::metadata(&dir)
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false);
            if !is_dir {
                tokio::fs::create_dir_all(&dir).await?;
                self.event(&format!("Created output directory: {}", dir.display()));
            }
        }

        self.transition(SchedulerState::WaitingForDawn);
        let delay = record_window.delay_from(epoch_seconds(&self.clock.now()));
        if delay > 0.0 {
            self.event(&format!(
                "Delaying start for {:.0} seconds until dawn",
                delay
            ));
            self.clock.sleep(seconds(delay)?).await;
        }

        self.transition(SchedulerState::Recording);
        self.event("Starting recording session");
        metrics::set_session_active(true);

        let started_at = self.clock.now();
        let mut session = Session::begin(epoch_seconds(&started_at), record_window.end_epoch);

        while session.running {
            let cycle = Instant::now();
            let frame = self.capture_with_retry(camera).await?;
            let path = self.persist(frame, session.frame_index).await?;
            metrics::record_frame(camera.implementation(), cycle.elapsed().as_secs_f64());
            self.event(&format!("Created image {}", path.display()));
            session.advance();

            let now_epoch = epoch_seconds(&self.clock.now());
            if session.is_past_end(now_epoch) {
                session.running = false;
                continue;
            }

            let delay = session.next_delay(now_epoch, self.plan.frame_period_secs);
            debug!(delay_secs = delay, "Sleeping until next frame");
            self.clock.sleep(seconds(delay)?).await;

            session.running = !session.is_past_end(epoch_seconds(&self.clock.now()));
        }

        self.event("Ending recording session");
        info!(
            frames = session.frames_captured(),
            "Recording session complete"
        );

        Ok(SessionSummary {
            state: self.state,
            window,
            record_window,
            started_at,
            ended_at: self.clock.now(),
            frames_captured: session.frames_captured(),
            next_frame_index: session.frame_index,
            sensor: camera.name().to_string(),
            implementation: camera.implementation().to_string(),
        })
    }

    async fn capture_with_retry(&self, camera: &mut dyn CameraDevice) -> RecorderResult<Frame> {
        let mut failures = 0u32;
        loop {
            match camera.capture().await {
                Ok(frame) => return Ok(frame),
                Err(e) => {
                    failures += 1;
                    metrics::record_capture_failure(camera.implementation());
                    if !self.plan.retry.should_retry(failures) {
                        self.event(&format!("Capture failed: {}", e));
                        return Err(RecorderError::Capture(e));
                    }

                    let delay = self.plan.retry.delay_for_attempt(failures);
                    warn!(
                        attempt = failures,
                        max_retries = self.plan.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Capture failed, retrying: {}",
                        e
                    );
                    self.clock.sleep(delay).await;
                }
            }
        }
    }

    /// Adapt and encode a frame on the blocking pool.
    async fn persist(&self, frame: Frame, index: u64) -> RecorderResult<PathBuf> {
        let adapter = self.plan.adapter;
        let path = self.plan.template.render(index);
        let target = path.clone();

        tokio::task::spawn_blocking(move || adapter.adapt(&frame).save(&target))
            .await
            .map_err(|e| RecorderError::internal(format!("frame writer failed: {}", e)))?
            .map_err(RecorderError::Persist)?;

        Ok(path)
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!(from = %self.state, to = %next, "Scheduler transition");
        self.state = next;
    }

    fn event(&self, message: &str) {
        self.log.event_at(&self.clock.now(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_record_window_today() {
        let now = at(5, 0);
        let record = RecordWindow::resolve(&DaylightWindow::new(6.0, 8.0), &now);

        assert_eq!(record.delay_from(epoch_seconds(&now)), 3600.0);
        assert_eq!(record.duration_secs(), 7200.0);
    }

    #[test]
    fn test_record_window_rolls_forward_after_end() {
        let now = at(10, 0);
        let today = DaylightWindow::new(1.0, 2.0);
        let record = RecordWindow::resolve(&today, &now);

        let midnight = epoch_seconds(&at(0, 0));
        assert_eq!(record.start_epoch, midnight + 3600.0 + SECONDS_PER_DAY);
        assert_eq!(record.end_epoch, midnight + 7200.0 + SECONDS_PER_DAY);
        assert_eq!(record.delay_from(epoch_seconds(&now)), 54_000.0);
    }

    #[test]
    fn test_record_window_open_has_no_delay() {
        let now = at(7, 0);
        let record = RecordWindow::resolve(&DaylightWindow::new(6.0, 8.0), &now);
        assert_eq!(record.delay_from(epoch_seconds(&now)), 0.0);
    }

    #[test]
    fn test_session_index_off_by_one() {
        let mut session = Session::begin(0.0, 100.0);
        assert_eq!(session.frame_index, 1);
        assert_eq!(session.frames_captured(), 0);

        for _ in 0..3 {
            session.advance();
        }
        assert_eq!(session.frame_index, 4);
        assert_eq!(session.frames_captured(), 3);
    }

    #[test]
    fn test_drift_corrected_delay() {
        let session = Session::begin(1000.0, 5000.0);

        assert_eq!(session.next_delay(1000.0, 60.0), 60.0);
        assert_eq!(session.next_delay(1007.0, 60.0), 53.0);
        // Overhead past one period lands on the following slot
        assert_eq!(session.next_delay(1075.0, 60.0), 45.0);
    }

    #[test]
    fn test_session_end() {
        let session = Session::begin(0.0, 120.0);
        assert!(!session.is_past_end(119.5));
        assert!(session.is_past_end(120.0));
    }

    #[test]
    fn test_fixed_window_source() {
        let source = WindowSource::Fixed(DaylightWindow::new(6.0, 8.0));
        assert_eq!(source.resolve(&at(3, 0)), DaylightWindow::new(6.0, 8.0));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SchedulerState::WaitingForDawn.to_string(), "waiting_for_dawn");
    }
}
