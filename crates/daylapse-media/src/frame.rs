//! Captured frame buffer.

use std::path::Path;

use daylapse_models::Resolution;
use image::{Rgb, RgbImage};

use crate::error::{MediaError, MediaResult};

/// A decoded 8-bit, 3-channel frame.
///
/// Frames live for one capture cycle: the camera produces one, the adapter
/// consumes it and the scheduler persists the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from raw interleaved RGB bytes.
    pub fn from_raw(resolution: Resolution, data: Vec<u8>) -> MediaResult<Self> {
        RgbImage::from_raw(resolution.width, resolution.height, data)
            .map(Self::new)
            .ok_or_else(|| {
                MediaError::internal(format!("buffer does not match {} RGB frame", resolution))
            })
    }

    /// Frame filled with a single color.
    pub fn filled(resolution: Resolution, color: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(
            resolution.width,
            resolution.height,
            Rgb(color),
        ))
    }

    /// Decode an encoded image (PNG, JPEG, ...) into a frame.
    pub fn decode(bytes: &[u8]) -> MediaResult<Self> {
        Ok(Self::new(image::load_from_memory(bytes)?.to_rgb8()))
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Encode to disk; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> MediaResult<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}
