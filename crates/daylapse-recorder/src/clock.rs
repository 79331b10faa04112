//! Wall-clock access and sleeping.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, TimeZone};

use crate::error::{RecorderError, RecorderResult};

/// Source of the current local time and of suspension.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    async fn sleep(&self, duration: Duration);
}

/// Local system time with tokio sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn epoch_seconds<Tz: TimeZone>(time: &DateTime<Tz>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Duration from a possibly negative number of seconds.
///
/// Negative values clamp to zero; NaN, infinite or oversized values are
/// rejected.
pub fn seconds(value: f64) -> RecorderResult<Duration> {
    let clamped = if value < 0.0 { 0.0 } else { value };
    Duration::try_from_secs_f64(clamped)
        .map_err(|_| RecorderError::internal(format!("cannot sleep for {} seconds", value)))
}
