//! Daylight window in local hours.

use serde::{Deserialize, Serialize};

/// Local-time interval during which recording is permitted.
///
/// Hours are offsets from local midnight. `start_hour` may be negative and
/// `end_hour` may exceed 24 when the window crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaylightWindow {
    pub start_hour: f64,
    pub end_hour: f64,
}

impl DaylightWindow {
    /// Create a new window.
    pub const fn new(start_hour: f64, end_hour: f64) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Zero-length window at the given instant.
    pub const fn instant(hour: f64) -> Self {
        Self::new(hour, hour)
    }

    /// Window length in hours.
    pub fn length_hours(&self) -> f64 {
        self.end_hour - self.start_hour
    }

    /// True for a polar-night window.
    pub fn is_degenerate(&self) -> bool {
        self.length_hours() <= 0.0
    }

    /// Widen the window by the dawn and dusk buffers (minutes).
    pub fn with_buffers(&self, dawn_minutes: f64, dusk_minutes: f64) -> Self {
        Self::new(
            self.start_hour - dawn_minutes / 60.0,
            self.end_hour + dusk_minutes / 60.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_widen_degenerate_window() {
        let window = DaylightWindow::instant(12.5);
        assert!(window.is_degenerate());

        let buffered = window.with_buffers(30.0, 90.0);
        assert!((buffered.start_hour - 12.0).abs() < 1e-9);
        assert!((buffered.end_hour - 14.0).abs() < 1e-9);
        assert!(!buffered.is_degenerate());
    }
}
