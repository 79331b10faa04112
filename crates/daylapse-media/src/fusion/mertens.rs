//! Mertens exposure fusion.
//!
//! Every exposure gets a per-pixel weight from contrast (Laplacian
//! magnitude), saturation (channel standard deviation) and
//! well-exposedness (closeness to mid-grey). Weights are normalized across
//! exposures and the images are blended level by level in a Laplacian
//! pyramid, which hides the seams a per-pixel blend would leave.

use daylapse_models::Resolution;
use image::{Rgb, RgbImage};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::pyramid::{collapse, gaussian_pyramid, laplacian_pyramid, level_count, Plane};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

const WELL_EXPOSED_SIGMA: f32 = 0.2;
const WEIGHT_EPSILON: f32 = 1e-12;

/// Exponents applied to each quality measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FusionWeights {
    pub contrast: f32,
    pub saturation: f32,
    pub exposedness: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            saturation: 1.0,
            exposedness: 1.0,
        }
    }
}

/// One exposure split into normalized RGB planes.
struct Exposure {
    channels: [Plane; 3],
}

impl Exposure {
    fn from_frame(frame: &Frame) -> Self {
        let image = frame.image();
        let (w, h) = image.dimensions();
        let shape = (h as usize, w as usize);
        let channel = |c: usize| {
            Array2::from_shape_fn(shape, |(y, x)| {
                image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
            })
        };
        Self {
            channels: [channel(0), channel(1), channel(2)],
        }
    }

    fn dim(&self) -> (usize, usize) {
        self.channels[0].dim()
    }

    fn weight(&self, weights: &FusionWeights) -> Plane {
        let (h, w) = self.dim();
        let [r, g, b] = &self.channels;

        let gray = Array2::from_shape_fn((h, w), |idx| {
            0.299 * r[idx] + 0.587 * g[idx] + 0.114 * b[idx]
        });
        let contrast = laplacian_magnitude(&gray);

        Array2::from_shape_fn((h, w), |idx| {
            let (rv, gv, bv) = (r[idx], g[idx], b[idx]);

            let mean = (rv + gv + bv) / 3.0;
            let saturation = (((rv - mean).powi(2) + (gv - mean).powi(2) + (bv - mean).powi(2))
                / 3.0)
                .sqrt();

            let exposedness = [rv, gv, bv]
                .iter()
                .map(|v| (-(v - 0.5).powi(2) / (2.0 * WELL_EXPOSED_SIGMA.powi(2))).exp())
                .product::<f32>();

            contrast[idx].powf(weights.contrast)
                * saturation.powf(weights.saturation)
                * exposedness.powf(weights.exposedness)
                + WEIGHT_EPSILON
        })
    }
}

/// Absolute response of the 4-neighbour Laplacian, edges replicated.
fn laplacian_magnitude(gray: &Plane) -> Plane {
    let (h, w) = gray.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let up = gray[[y.saturating_sub(1), x]];
        let down = gray[[(y + 1).min(h - 1), x]];
        let left = gray[[y, x.saturating_sub(1)]];
        let right = gray[[y, (x + 1).min(w - 1)]];
        (up + down + left + right - 4.0 * gray[[y, x]]).abs()
    })
}

/// Fuse a bracketed exposure sequence into one frame.
pub fn merge_mertens(frames: &[Frame], weights: &FusionWeights) -> MediaResult<Frame> {
    let first = frames
        .first()
        .ok_or_else(|| MediaError::fusion("no exposures to fuse"))?;
    let resolution = first.resolution();
    if let Some(odd) = frames.iter().find(|f| f.resolution() != resolution) {
        return Err(MediaError::fusion(format!(
            "exposure size mismatch: {} vs {}",
            odd.resolution(),
            resolution
        )));
    }
    if frames.len() == 1 {
        return Ok(first.clone());
    }

    let exposures: Vec<Exposure> = frames.par_iter().map(Exposure::from_frame).collect();
    let mut weight_maps: Vec<Plane> = exposures.par_iter().map(|e| e.weight(weights)).collect();

    // Normalize so the weights at each pixel sum to one
    let total = weight_maps
        .iter()
        .skip(1)
        .fold(weight_maps[0].clone(), |acc, w| acc + w);
    for map in &mut weight_maps {
        *map /= &total;
    }

    let (h, w) = exposures[0].dim();
    let levels = level_count(h, w);

    // Per exposure: weight pyramid, then each channel's Laplacian pyramid scaled by it
    let blended: Vec<[Vec<Plane>; 3]> = exposures
        .into_par_iter()
        .zip(weight_maps.into_par_iter())
        .map(|(exposure, weight)| {
            let weight_pyramid = gaussian_pyramid(weight, levels);
            exposure.channels.map(|channel| {
                laplacian_pyramid(channel, levels)
                    .into_iter()
                    .zip(&weight_pyramid)
                    .map(|(level, weight)| level * weight)
                    .collect()
            })
        })
        .collect();

    let fused = (0..3)
        .map(|c| {
            let summed: Vec<Plane> = (0..=levels)
                .map(|level| {
                    blended
                        .iter()
                        .skip(1)
                        .fold(blended[0][c][level].clone(), |acc, pyramids| {
                            acc + &pyramids[c][level]
                        })
                })
                .collect();
            collapse(summed).ok_or_else(|| MediaError::fusion("empty pyramid"))
        })
        .collect::<MediaResult<Vec<Plane>>>()?;

    Ok(to_frame(&fused, resolution))
}

fn to_frame(channels: &[Plane], resolution: Resolution) -> Frame {
    let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    Frame::new(RgbImage::from_fn(resolution.width, resolution.height, |x, y| {
        let idx = [y as usize, x as usize];
        Rgb([
            quantize(channels[0][idx]),
            quantize(channels[1][idx]),
            quantize(channels[2][idx]),
        ])
    }))
}
