//! Frame resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Pixel dimensions of a frame or of the configured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a new resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the aspect ratio (width / height) as a decimal.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True when both dimensions are strictly larger than `other`'s.
    pub fn exceeds(&self, other: &Resolution) -> bool {
        self.width > other.width && self.height > other.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ModelError::InvalidResolution(s.to_string()))?;

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidResolution(s.to_string()))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidResolution(s.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ModelError::InvalidResolution(s.to_string()));
        }

        Ok(Self { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!("1920x1080".parse::<Resolution>().unwrap(), Resolution::new(1920, 1080));
        assert_eq!("640 X 480".parse::<Resolution>().unwrap(), Resolution::new(640, 480));
        assert!("1920".parse::<Resolution>().is_err());
        assert!("0x1080".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_exceeds() {
        let frame = Resolution::new(2592, 1944);
        assert!(frame.exceeds(&Resolution::new(1920, 1080)));
        assert!(!frame.exceeds(&Resolution::new(2592, 1080)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Resolution::new(1280, 720).to_string(), "1280x720");
    }
}
