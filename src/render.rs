/**
 * Dot Renderer
 *
 * Rasterizes halftone dots with `tiny-skia`. Area shapes (circle, diamond,
 * square) are filled; line shapes are stroked with a pen whose width is the
 * dot radius, rotated to the screen angle.
 *
 * STEADINESS
 * ==========
 * Below a steadiness of 10 each dot radius is perturbed independently on
 * both axes by a factor of `1 + (u - 0.5) / steadiness` with `u` uniform in
 * [0, 1). Low values give the irregular look of a worn printing press.
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::color::Color;

/// Steadiness from which jitter is disabled
pub const STEADINESS_STABLE: u32 = 10;

/// Shape drawn for each halftone cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DotShape {
    /// Filled circle (ellipse when jittered)
    #[default]
    Circle,
    /// Filled diamond
    Diamond,
    /// Filled square
    Square,
    /// Line segment with flat caps
    FlatLine,
    /// Line segment with round caps
    RoundLine,
}

impl DotShape {
    /// True for shapes stroked with a pen
    pub fn is_line(self) -> bool {
        matches!(self, DotShape::FlatLine | DotShape::RoundLine)
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            DotShape::Circle => "Circle",
            DotShape::Diamond => "Diamond",
            DotShape::Square => "Square",
            DotShape::FlatLine => "Flat line",
            DotShape::RoundLine => "Rounded line",
        }
    }
}

/// Edge quality of rendered dots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Antialiasing {
    /// Hard pixel edges
    None,
    /// Antialiased edges
    #[default]
    Normal,
    /// Antialiased edges followed by a light gaussian blur
    Soft,
}

impl Antialiasing {
    /// True when the rasterizer should antialias
    pub fn is_enabled(self) -> bool {
        self != Antialiasing::None
    }
}

/// Random dot size perturbation
#[derive(Debug, Clone)]
pub struct Jitter {
    steadiness: u32,
    rng: Option<StdRng>,
}

impl Jitter {
    /// Jitter for a steadiness value, seeded for reproducibility when asked
    pub fn new(steadiness: u32, seed: Option<u64>) -> Self {
        let rng = if steadiness > 0 && steadiness < STEADINESS_STABLE {
            Some(match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            })
        } else {
            None
        };

        Self { steadiness, rng }
    }

    /// Jitter that never changes anything
    pub fn disabled() -> Self {
        Self {
            steadiness: STEADINESS_STABLE,
            rng: None,
        }
    }

    /// True when radii are perturbed
    pub fn is_active(&self) -> bool {
        self.rng.is_some()
    }

    /// Perturbed (x, y) radii for a dot of the given radius
    pub fn radii(&mut self, radius: f64) -> (f64, f64) {
        let steadiness = self.steadiness as f64;
        match self.rng.as_mut() {
            Some(rng) => {
                let rx = radius * (1.0 + (rng.gen::<f64>() - 0.5) / steadiness);
                let ry = radius * (1.0 + (rng.gen::<f64>() - 0.5) / steadiness);
                (rx, ry)
            }
            None => (radius, radius),
        }
    }
}

/// Draws one shape per halftone cell into a pixmap
pub struct DotRenderer {
    shape: DotShape,
    dot_size: f64,
    line_angle: f32,
    extend_lines: bool,
    paint: Paint<'static>,
    stroke: Stroke,
    jitter: Jitter,
}

impl DotRenderer {
    /// Create a renderer
    ///
    /// `line_angle` is the rotation (degrees) applied to line shapes around
    /// the cell center; `rotated_grid` extends flat lines by half a pixel on
    /// both ends so neighbouring segments of a rotated screen join.
    pub fn new(
        shape: DotShape,
        dot_size: f64,
        line_angle: f64,
        rotated_grid: bool,
        color: Color,
        antialiasing: Antialiasing,
        jitter: Jitter,
    ) -> Self {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = antialiasing.is_enabled();

        let stroke = Stroke {
            line_cap: match shape {
                DotShape::RoundLine => LineCap::Round,
                _ => LineCap::Butt,
            },
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };

        Self {
            shape,
            dot_size,
            line_angle: line_angle as f32,
            extend_lines: rotated_grid && shape == DotShape::FlatLine,
            paint,
            stroke,
            jitter,
        }
    }

    /// Draw the dot for a cell, applying jitter to the radius
    pub fn render_dot(&mut self, pixmap: &mut Pixmap, center: (f64, f64), radius: f64) {
        let (rx, ry) = self.jitter.radii(radius);
        self.draw(pixmap, center, rx, ry);
    }

    /// Draw a dot with explicit radii
    pub fn draw(&mut self, pixmap: &mut Pixmap, center: (f64, f64), rx: f64, ry: f64) {
        if !(rx > 0.0 && ry > 0.0) {
            return;
        }

        let cx = center.0 as f32;
        let cy = center.1 as f32;
        let rx_f = rx as f32;
        let ry_f = ry as f32;

        match self.shape {
            DotShape::Circle => {
                let path = Rect::from_xywh(cx - rx_f, cy - ry_f, 2.0 * rx_f, 2.0 * ry_f)
                    .and_then(PathBuilder::from_oval);
                if let Some(path) = path {
                    pixmap.fill_path(&path, &self.paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            DotShape::Diamond => {
                let mut builder = PathBuilder::new();
                builder.move_to(cx, cy - ry_f);
                builder.line_to(cx + rx_f, cy);
                builder.line_to(cx, cy + ry_f);
                builder.line_to(cx - rx_f, cy);
                builder.close();
                if let Some(path) = builder.finish() {
                    pixmap.fill_path(&path, &self.paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            DotShape::Square => {
                if let Some(rect) = Rect::from_xywh(cx - rx_f, cy - ry_f, rx_f, ry_f) {
                    pixmap.fill_rect(rect, &self.paint, Transform::identity(), None);
                }
            }
            DotShape::FlatLine | DotShape::RoundLine => {
                // Cell frame: the segment runs along the lower half of the cell
                let length = self.dot_size as f32;
                let offset = length / 2.0;
                let extension = if self.extend_lines { 0.5 } else { 0.0 };

                let mut builder = PathBuilder::new();
                builder.move_to(-extension, offset);
                builder.line_to(length + extension, offset);

                if let Some(path) = builder.finish() {
                    self.stroke.width = rx_f;
                    let transform = Transform::from_translate(cx, cy).pre_rotate(self.line_angle);
                    pixmap.stroke_path(&path, &self.paint, &self.stroke, transform, None);
                }
            }
        }
    }
}
