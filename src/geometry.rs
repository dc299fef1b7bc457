/**
 * Halftone Geometry
 *
 * Sampling grid generation for halftone screens.
 *
 * ROTATED SCREENS
 * ===============
 * A screen angle does not rotate the image: it rotates the scan pattern.
 * The grid of dot cells is laid out axis-aligned in "screen space", then
 * every cell center is mapped through a rotation about the image center
 * back to source pixel coordinates. The screen-space extent is the bounding
 * box of the rotated canvas corners joined with the canvas itself, widened
 * by half a pitch on each side, so every canvas pixel is within half a pitch
 * of a cell center and no corner is left unscreened.
 *
 * For 0° and 90° no transform is needed; the canvas is only widened by half
 * a dot on each side so the edge cells are centered on the border.
 *
 * DOT COVERAGE
 * ============
 * A circle of radius sqrt(2)·(W/2) passes through the corners of its
 * W×W cell, so a 100% dark circle fills the cell. A diamond reaches the
 * same coverage at 1.5·(W/2). Squares and lines scale with W directly.
 */

use crate::render::DotShape;

/// Screen angles treated as axis-aligned (no transform)
const AXIS_ALIGNED_ANGLES: [f64; 2] = [0.0, 90.0];

/// Check whether a screen angle needs no coordinate transform
pub fn is_axis_aligned(rotation_degrees: f64) -> bool {
    let normalized = rotation_degrees.rem_euclid(360.0);
    AXIS_ALIGNED_ANGLES.contains(&normalized)
}

/// Radius at which a dot of the given shape covers its whole cell
///
/// Circle and diamond radii are multiplied by this factor; squares and lines
/// use the dot size itself.
pub fn full_coverage_factor(shape: DotShape, dot_size: f64) -> f64 {
    let half_size = dot_size / 2.0;
    match shape {
        DotShape::Circle => (2.0 * half_size * half_size).sqrt(),
        DotShape::Diamond => 1.5 * half_size,
        DotShape::Square | DotShape::FlatLine | DotShape::RoundLine => dot_size,
    }
}

/// Distance between two neighbouring cell centers
pub fn cell_pitch(dot_size: f64, adjustment_pct: f64) -> f64 {
    dot_size + dot_size * adjustment_pct / 100.0
}

/// Rotation about a fixed center point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationTransform {
    cos: f64,
    sin: f64,
    center_x: f64,
    center_y: f64,
}

impl RotationTransform {
    /// Rotation of the screen by `rotation_degrees` about the canvas center
    ///
    /// The angle is negated: a positive screen angle turns the scan lines
    /// counter-clockwise on a y-down canvas.
    pub fn new(rotation_degrees: f64, width: f64, height: f64) -> Self {
        let radians = -rotation_degrees.to_radians();
        Self {
            cos: radians.cos(),
            sin: radians.sin(),
            center_x: width / 2.0,
            center_y: height / 2.0,
        }
    }

    /// Map a point through the rotation
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let xt = x - self.center_x;
        let yt = y - self.center_y;
        (
            xt * self.cos - yt * self.sin + self.center_x,
            xt * self.sin + yt * self.cos + self.center_y,
        )
    }

    /// The opposite rotation about the same center
    pub fn inverse(&self) -> Self {
        Self {
            sin: -self.sin,
            ..*self
        }
    }
}

/// Axis-aligned rectangle in floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl Bounds {
    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Check whether a point lies inside (edges included)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// One dot cell of a sampling grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Cell center in screen space
    pub screen: (f64, f64),
    /// Cell center mapped back to source pixel coordinates
    pub source: (f64, f64),
}

/// Grid of dot cell centers covering a canvas
#[derive(Debug, Clone)]
pub struct SamplingGrid {
    xs: Vec<f64>,
    ys: Vec<f64>,
    bounds: Bounds,
    pitch: f64,
    transform: Option<RotationTransform>,
}

impl SamplingGrid {
    /// Build the grid for a `width`×`height` canvas
    ///
    /// `adjustment_pct` widens (or narrows, when negative) the spacing
    /// between cells as a percentage of the dot size.
    pub fn new(
        width: u32,
        height: u32,
        dot_size: f64,
        adjustment_pct: f64,
        rotation_degrees: f64,
    ) -> Self {
        let width_f = width as f64;
        let height_f = height as f64;
        let pitch = cell_pitch(dot_size, adjustment_pct);

        let (bounds, transform) = if is_axis_aligned(rotation_degrees) {
            let half_size = (dot_size / 2.0).trunc();
            let bounds = Bounds {
                left: -half_size,
                top: -half_size,
                right: width_f + half_size,
                bottom: height_f + half_size,
            };
            (bounds, None)
        } else {
            let transform = RotationTransform::new(rotation_degrees, width_f, height_f);
            let rotated = Self::rotated_bounds(&transform, width_f, height_f);
            let margin = pitch / 2.0;
            let bounds = Bounds {
                left: rotated.left - margin,
                top: rotated.top - margin,
                right: rotated.right + margin,
                bottom: rotated.bottom + margin,
            };
            (bounds, Some(transform))
        };

        let empty = width == 0 || height == 0;
        let steps = |start: f64, extent: f64| -> Vec<f64> {
            if empty || pitch <= 0.0 || extent <= 0.0 {
                return Vec::new();
            }
            let count = (extent / pitch).ceil() as usize;
            (0..count).map(|i| start + pitch * i as f64).collect()
        };

        Self {
            xs: steps(bounds.left, bounds.width()),
            ys: steps(bounds.top, bounds.height()),
            bounds,
            pitch,
            transform,
        }
    }

    /// Screen-space extent of a rotated canvas
    fn rotated_bounds(transform: &RotationTransform, width: f64, height: f64) -> Bounds {
        let corners = [(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)];

        let mut bounds = Bounds {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: height,
        };

        for (x, y) in corners {
            let (xr, yr) = transform.apply(x, y);
            bounds.left = bounds.left.min(xr);
            bounds.right = bounds.right.max(xr);
            bounds.top = bounds.top.min(yr);
            bounds.bottom = bounds.bottom.max(yr);
        }

        bounds
    }

    /// Number of cells per grid row
    pub fn columns(&self) -> usize {
        self.xs.len()
    }

    /// Number of grid rows
    pub fn rows(&self) -> usize {
        self.ys.len()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    /// True when the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Screen-space extent covered by the grid
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Distance between neighbouring cell centers
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Rotation applied to cell centers, `None` for axis-aligned grids
    pub fn transform(&self) -> Option<&RotationTransform> {
        self.transform.as_ref()
    }

    /// Map a screen-space point to source pixel coordinates
    #[inline]
    pub fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        match &self.transform {
            Some(transform) => transform.apply(x, y),
            None => (x, y),
        }
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.ys.iter().flat_map(move |&y| {
            self.xs.iter().map(move |&x| GridCell {
                screen: (x, y),
                source: self.to_source(x, y),
            })
        })
    }
}
