//! Session report.

use std::path::Path;

use daylapse_models::ReportKey;

use crate::config::Settings;
use crate::error::RecorderResult;
use crate::scheduler::SessionSummary;

/// Values summarized at the end of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    date: String,
    start_time: String,
    end_time: String,
    latitude: f64,
    longitude: f64,
    time_scale: f64,
    device: String,
    implementation: String,
    frames: u64,
}

impl SessionReport {
    pub fn new(settings: &Settings, summary: &SessionSummary) -> Self {
        Self {
            date: summary.started_at.format("%Y-%m-%d").to_string(),
            start_time: summary.started_at.format("%H:%M:%S").to_string(),
            end_time: summary.ended_at.format("%H:%M:%S").to_string(),
            latitude: settings.latitude,
            longitude: settings.longitude,
            time_scale: settings.time_scale,
            device: settings.device.clone(),
            implementation: summary.implementation.clone(),
            frames: summary.frames_captured,
        }
    }

    /// The literal line for one key.
    pub fn line(&self, key: ReportKey) -> String {
        match key {
            ReportKey::Date => format!("Date: {}", self.date),
            ReportKey::StartTime => format!("Start time: {}", self.start_time),
            ReportKey::EndTime => format!("End time: {}", self.end_time),
            ReportKey::Coordinates => {
                format!("Coordinates: {}, {}", self.latitude, self.longitude)
            }
            ReportKey::ApproximateCoordinates => format!(
                "Approximate coordinates: {:.1}, {:.1}",
                self.latitude, self.longitude
            ),
            ReportKey::TimeScale => format!("Time scale: 1:{}", self.time_scale),
            ReportKey::Device => format!("Device: {}", self.device),
            ReportKey::Implementation => format!("Implementation: {}", self.implementation),
            ReportKey::FrameCount => format!("Frames: {}", self.frames),
        }
    }

    pub fn lines(&self, keys: &[ReportKey]) -> Vec<String> {
        keys.iter().map(|key| self.line(*key)).collect()
    }

    pub fn render(&self, keys: &[ReportKey]) -> String {
        let mut text = self.lines(keys).join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    /// Write the report, replacing any previous one.
    pub async fn write(&self, path: impl AsRef<Path>, keys: &[ReportKey]) -> RecorderResult<()> {
        tokio::fs::write(path.as_ref(), self.render(keys)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SessionReport {
        SessionReport {
            date: "2024-06-01".to_string(),
            start_time: "06:00:00".to_string(),
            end_time: "08:00:00".to_string(),
            latitude: 52.52,
            longitude: 13.405,
            time_scale: 60.0,
            device: "Garden rig".to_string(),
            implementation: "Single exposure".to_string(),
            frames: 120,
        }
    }

    #[test]
    fn test_lines_follow_key_order() {
        let lines = report().lines(&[ReportKey::FrameCount, ReportKey::Date]);
        assert_eq!(lines, vec!["Frames: 120", "Date: 2024-06-01"]);
    }

    #[test]
    fn test_coordinates() {
        let report = report();
        assert_eq!(report.line(ReportKey::Coordinates), "Coordinates: 52.52, 13.405");
        assert_eq!(
            report.line(ReportKey::ApproximateCoordinates),
            "Approximate coordinates: 52.5, 13.4"
        );
        assert_eq!(report.line(ReportKey::TimeScale), "Time scale: 1:60");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let keys = ReportKey::parse_list(&["device", "weather", "implementation"]);
        assert_eq!(
            report().render(&keys),
            "Device: Garden rig\nImplementation: Single exposure\n"
        );
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        report().write(&path, &ReportKey::ALL).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), ReportKey::ALL.len());
        assert!(text.starts_with("Date: 2024-06-01\n"));
    }
}
