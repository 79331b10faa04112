//! Scale-and-crop shaping of captured frames.
//!
//! Frames are only ever scaled down. When a frame is larger than the target
//! in both dimensions it is resized so the binding dimension matches the
//! target exactly, then center-cropped along the other dimension.

use daylapse_models::Resolution;
use image::imageops::{self, FilterType};

use crate::frame::Frame;

/// Geometry of a scale-and-crop operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    /// Size the frame is resized to before cropping
    pub scaled: Resolution,
    /// Top-left corner of the crop inside the scaled frame
    pub offset_x: u32,
    pub offset_y: u32,
    /// Final output size
    pub target: Resolution,
}

/// Shapes frames to the configured output resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAdapter {
    target: Option<Resolution>,
}

impl FrameAdapter {
    /// Create an adapter; `None` passes frames through unchanged.
    pub fn new(target: Option<Resolution>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Option<Resolution> {
        self.target
    }

    /// Adapt a frame to the target resolution.
    pub fn adapt(&self, frame: &Frame) -> Frame {
        match self.target.and_then(|target| plan_crop(frame.resolution(), target)) {
            Some(plan) => apply(frame, &plan),
            None => frame.clone(),
        }
    }
}

/// Compute the scale-and-crop geometry, or `None` when the frame must be
/// returned unchanged (same size, or smaller than target in either axis).
pub fn plan_crop(frame: Resolution, target: Resolution) -> Option<CropPlan> {
    if !frame.exceeds(&target) {
        return None;
    }

    let frame_aspect = frame.aspect();
    let scaled = if target.aspect() > frame_aspect {
        // Target is wider: width binds, height is cropped
        Resolution::new(
            target.width,
            (target.width as f64 / frame_aspect + 0.5) as u32,
        )
    } else {
        Resolution::new(
            (target.height as f64 * frame_aspect + 0.5) as u32,
            target.height,
        )
    };

    Some(CropPlan {
        scaled,
        offset_x: scaled.width.saturating_sub(target.width) / 2,
        offset_y: scaled.height.saturating_sub(target.height) / 2,
        target,
    })
}

fn apply(frame: &Frame, plan: &CropPlan) -> Frame {
    let resized = imageops::resize(
        frame.image(),
        plan.scaled.width,
        plan.scaled.height,
        FilterType::Triangle,
    );
    let cropped = imageops::crop_imm(
        &resized,
        plan.offset_x,
        plan.offset_y,
        plan.target.width,
        plan.target.height,
    )
    .to_image();
    Frame::new(cropped)
}
