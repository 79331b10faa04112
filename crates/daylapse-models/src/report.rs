//! Session report line keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One line of the session report.
///
/// Keys are written in the order they are configured; the default order is
/// [`ReportKey::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKey {
    Date,
    StartTime,
    EndTime,
    Coordinates,
    ApproximateCoordinates,
    TimeScale,
    Device,
    Implementation,
    FrameCount,
}

impl ReportKey {
    pub const ALL: [ReportKey; 9] = [
        ReportKey::Date,
        ReportKey::StartTime,
        ReportKey::EndTime,
        ReportKey::Coordinates,
        ReportKey::ApproximateCoordinates,
        ReportKey::TimeScale,
        ReportKey::Device,
        ReportKey::Implementation,
        ReportKey::FrameCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKey::Date => "date",
            ReportKey::StartTime => "startTime",
            ReportKey::EndTime => "endTime",
            ReportKey::Coordinates => "coordinates",
            ReportKey::ApproximateCoordinates => "approximateCoordinates",
            ReportKey::TimeScale => "timeScale",
            ReportKey::Device => "device",
            ReportKey::Implementation => "implementation",
            ReportKey::FrameCount => "frameCount",
        }
    }

    /// Parse a list of configured key names, dropping names that are not keys.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<ReportKey> {
        names
            .iter()
            .filter_map(|name| name.as_ref().parse().ok())
            .collect()
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKey::ALL
            .iter()
            .find(|key| key.as_str() == s.trim())
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_ignores_unknown() {
        let keys = ReportKey::parse_list(&["frameCount", "weather", "date"]);
        assert_eq!(keys, vec![ReportKey::FrameCount, ReportKey::Date]);
    }

    #[test]
    fn test_names_roundtrip_with_serde() {
        for key in ReportKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }
}
