/**
 * Darkness Sampler
 *
 * Computes how dark a halftone cell is from the pixels under it. The source
 * is expected to be desaturated (R = G = B), so only the red byte is read.
 *
 * Transparency never darkens a cell: a half transparent black pixel is half
 * as dark as an opaque one, and fully transparent pixels are left out of the
 * average altogether. A cell with nothing but transparent pixels is skipped
 * and lets the background show through.
 */

use image::RgbaImage;

use crate::geometry::full_coverage_factor;
use crate::render::DotShape;

/// How many source pixels are read per cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sampling {
    /// Single pixel at the cell center
    Low,
    /// Every other pixel of the cell window
    #[default]
    Medium,
    /// Every pixel of the cell window
    High,
}

impl Sampling {
    /// Window step, `None` for single-pixel sampling
    fn window_step(self) -> Option<usize> {
        match self {
            Sampling::Low => None,
            Sampling::Medium => Some(2),
            Sampling::High => Some(1),
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Sampling::Low => "Low",
            Sampling::Medium => "Medium",
            Sampling::High => "High",
        }
    }
}

/// Darkness of a single pixel, `None` when fully transparent
///
/// Opaque pixels map `0..=255` to `1.0..=0.0`; partially transparent pixels
/// are weighted by alpha toward "no mark".
#[inline]
pub fn pixel_darkness(value: u8, alpha: u8) -> Option<f64> {
    match alpha {
        0 => None,
        255 => Some((255 - value) as f64 / 255.0),
        _ => Some((255 - value) as f64 * alpha as f64 / 65025.0),
    }
}

/// Darkness of the cell centered at `center`, in `[0, 1]`
///
/// Cells within a dot size of the buffer edge read the nearest edge pixels,
/// so a dot straddling the border still gets the colour it overlaps.
/// Returns `None` when the cell contributes no dot: it lies beyond that
/// margin, or all of its pixels are fully transparent.
pub fn sample_darkness(
    buffer: &RgbaImage,
    center: (f64, f64),
    dot_size: u32,
    sampling: Sampling,
) -> Option<f64> {
    let width = buffer.width() as i64;
    let height = buffer.height() as i64;
    let size = dot_size as i64;

    if width == 0 || height == 0 {
        return None;
    }

    // Truncation toward zero, as pixel coordinates of the center
    let x = center.0 as i64;
    let y = center.1 as i64;

    // Too far out for any part of the dot to reach the buffer
    if x < -size || y < -size || x >= width + size || y >= height + size {
        return None;
    }

    let read = |px: i64, py: i64| {
        let pixel = buffer.get_pixel(
            px.clamp(0, width - 1) as u32,
            py.clamp(0, height - 1) as u32,
        );
        pixel_darkness(pixel[0], pixel[3])
    };

    let Some(step) = sampling.window_step() else {
        return read(x, y);
    };

    let origin_x = x - size / 2;
    let origin_y = y - size / 2;

    let mut sum = 0.0;
    let mut count = 0usize;

    for dx in (0..size).step_by(step) {
        for dy in (0..size).step_by(step) {
            if let Some(darkness) = read(origin_x + dx, origin_y + dy) {
                sum += darkness;
                count += 1;
            }
        }
    }

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Dot radius for a darkness value
pub fn dot_radius(darkness: f64, shape: DotShape, dot_size: f64) -> f64 {
    darkness * full_coverage_factor(shape, dot_size)
}
