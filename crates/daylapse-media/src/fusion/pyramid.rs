//! Gaussian and Laplacian pyramids over single-channel planes.

use ndarray::Array2;

pub type Plane = Array2<f32>;

const KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Mirror an out-of-range index back into `0..len` without repeating the edge.
fn reflect(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        i = if i < 0 { -i } else { 2 * last - i };
    }
    i as usize
}

/// Separable 5-tap Gaussian blur, scaled by `gain` per axis.
fn blur(src: &Plane, gain: f32) -> Plane {
    let (h, w) = src.dim();
    let mut horizontal = Plane::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in KERNEL.iter().enumerate() {
                acc += weight * src[[y, reflect(x as isize + k as isize - 2, w)]];
            }
            horizontal[[y, x]] = acc * gain;
        }
    }

    let mut out = Plane::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in KERNEL.iter().enumerate() {
                acc += weight * horizontal[[reflect(y as isize + k as isize - 2, h), x]];
            }
            out[[y, x]] = acc * gain;
        }
    }
    out
}

/// Blur and drop every other row and column.
pub fn pyr_down(src: &Plane) -> Plane {
    let (h, w) = src.dim();
    let blurred = blur(src, 1.0);
    Plane::from_shape_fn(((h + 1) / 2, (w + 1) / 2), |(y, x)| blurred[[2 * y, 2 * x]])
}

/// Upsample to `(height, width)` by zero insertion and interpolation.
pub fn pyr_up(src: &Plane, shape: (usize, usize)) -> Plane {
    let (sh, sw) = src.dim();
    let mut spread = Plane::zeros(shape);
    for y in 0..sh.min((shape.0 + 1) / 2) {
        for x in 0..sw.min((shape.1 + 1) / 2) {
            spread[[2 * y, 2 * x]] = src[[y, x]];
        }
    }
    blur(&spread, 2.0)
}

pub fn gaussian_pyramid(base: Plane, levels: usize) -> Vec<Plane> {
    let mut pyramid = Vec::with_capacity(levels + 1);
    pyramid.push(base);
    for level in 0..levels {
        let next = pyr_down(&pyramid[level]);
        pyramid.push(next);
    }
    pyramid
}

pub fn laplacian_pyramid(base: Plane, levels: usize) -> Vec<Plane> {
    let gaussian = gaussian_pyramid(base, levels);
    let mut pyramid = Vec::with_capacity(levels + 1);
    for level in 0..levels {
        let current = &gaussian[level];
        let expanded = pyr_up(&gaussian[level + 1], current.dim());
        pyramid.push(current - &expanded);
    }
    if let Some(top) = gaussian.into_iter().last() {
        pyramid.push(top);
    }
    pyramid
}

/// Rebuild a plane from its Laplacian pyramid.
pub fn collapse(mut pyramid: Vec<Plane>) -> Option<Plane> {
    let mut result = pyramid.pop()?;
    while let Some(detail) = pyramid.pop() {
        result = pyr_up(&result, detail.dim()) + &detail;
    }
    Some(result)
}

/// Number of levels for an image of the given size.
pub fn level_count(height: usize, width: usize) -> usize {
    let smallest = height.min(width).max(1);
    (usize::BITS - 1 - smallest.leading_zeros()) as usize
}
