//! Exposure bracket presets for multi-exposure capture.
//!
//! Brackets are named by shutter speed: `Lowest` is the slowest shutter
//! (longest exposure, meant for the darkest conditions), `Highest` the
//! fastest. Each bracket pairs a shutter time with fixed white-balance
//! gains so consecutive frames of a sequence stay color-consistent.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Named exposure bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureBracket {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

/// Fixed shutter/white-balance pair for one bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposurePreset {
    /// Shutter time in microseconds
    pub shutter_us: u32,
    /// Red and blue white-balance gains
    pub awb_gains: (f32, f32),
}

impl ExposurePreset {
    pub fn shutter(&self) -> Duration {
        Duration::from_micros(self.shutter_us as u64)
    }
}

impl ExposureBracket {
    /// All brackets, slowest shutter first.
    pub const ALL: [ExposureBracket; 5] = [
        ExposureBracket::Lowest,
        ExposureBracket::Low,
        ExposureBracket::Medium,
        ExposureBracket::High,
        ExposureBracket::Highest,
    ];

    /// Brackets captured when the scene is too bright for the long exposures.
    pub const BRIGHT: [ExposureBracket; 3] = [
        ExposureBracket::Medium,
        ExposureBracket::High,
        ExposureBracket::Highest,
    ];

    /// Preset lookup table.
    pub const fn preset(self) -> ExposurePreset {
        match self {
            ExposureBracket::Lowest => ExposurePreset {
                shutter_us: 125_000,
                awb_gains: (1.5, 1.9),
            },
            ExposureBracket::Low => ExposurePreset {
                shutter_us: 33_333,
                awb_gains: (1.6, 1.7),
            },
            ExposureBracket::Medium => ExposurePreset {
                shutter_us: 8_000,
                awb_gains: (1.7, 1.5),
            },
            ExposureBracket::High => ExposurePreset {
                shutter_us: 2_000,
                awb_gains: (1.8, 1.4),
            },
            ExposureBracket::Highest => ExposurePreset {
                shutter_us: 500,
                awb_gains: (1.9, 1.3),
            },
        }
    }

    /// True for the two long-exposure brackets skipped in bright light.
    pub fn is_dark_bracket(self) -> bool {
        matches!(self, ExposureBracket::Lowest | ExposureBracket::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureBracket::Lowest => "lowest",
            ExposureBracket::Low => "low",
            ExposureBracket::Medium => "medium",
            ExposureBracket::High => "high",
            ExposureBracket::Highest => "highest",
        }
    }
}

impl fmt::Display for ExposureBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExposureBracket {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowest" => Ok(ExposureBracket::Lowest),
            "low" => Ok(ExposureBracket::Low),
            "medium" => Ok(ExposureBracket::Medium),
            "high" => Ok(ExposureBracket::High),
            "highest" => Ok(ExposureBracket::Highest),
            other => Err(ModelError::UnknownBracket(other.to_string())),
        }
    }
}
