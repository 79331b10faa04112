//! Daylight time-lapse recorder.
//!
//! This crate provides:
//! - The approximate solar daylight window calculation
//! - Settings loading and validation
//! - The recording scheduler (dawn delay, drift-corrected cadence, dusk cutoff)
//! - Session log formatting, session reports and post-recording commands

pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod retry;
pub mod runner;
pub mod scheduler;
pub mod solar;

pub use clock::{epoch_seconds, Clock, SystemClock};
pub use config::{RuntimeConfig, Settings};
pub use error::{RecorderError, RecorderResult};
pub use logging::{LogFormat, SessionLog};
pub use report::SessionReport;
pub use retry::RetryPolicy;
pub use runner::record_and_publish;
pub use scheduler::{
    RecordWindow, RecordingPlan, RecordingScheduler, SchedulerState, Session, SessionSummary,
    WindowSource,
};
pub use solar::compute_daylight_window;
