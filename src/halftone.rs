/**
 * Halftone Pass
 *
 * Turns one desaturated layer into a halftone screen, in place.
 *
 * PIPELINE
 * ========
 * 1. Resolve the effective parameters for the channel: monochrome uses the
 *    user colors and rotation, process inks use their preset color, a white
 *    background and the angle of the selected screen scheme.
 * 2. Lay a sampling grid over the layer extent.
 * 3. Visit the cells row by row: sample the darkness under each one and
 *    draw a dot of matching size onto a canvas pre-filled with the
 *    background.
 * 4. Write the canvas back over the layer and, for soft antialiasing, blur
 *    it slightly.
 *
 * Rendering is deterministic for a fixed seed: cells are always visited in
 * the same order and jitter is only drawn for cells that produce a dot.
 */

use image::{Rgba, RgbaImage};
use log::debug;
use thiserror::Error;
use tiny_skia::Pixmap;

use crate::color::Color;
use crate::filter::{DesaturateMethod, Filter};
use crate::geometry::{is_axis_aligned, SamplingGrid};
use crate::layer::{LayerError, LayerHost, LayerId};
use crate::modes::ScreenAngles;
use crate::progress::Progress;
use crate::recipe::{Channel, HALFTONE_STEPS};
use crate::render::{Antialiasing, DotRenderer, DotShape, Jitter, STEADINESS_STABLE};
use crate::sampler::{dot_radius, sample_darkness, Sampling};

/// Error types for halftone rendering
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalftoneError {
    /// Dot size outside 1-256 px
    #[error("Dot size must be between 1 and 256 pixels, got {0}")]
    InvalidDotSize(f64),

    /// Size adjustment outside -50-100 %
    #[error("Size adjustment must be between -50% and 100%, got {0}%")]
    InvalidAdjustment(f64),

    /// Steadiness outside 1-20
    #[error("Steadiness must be between 1 and 20, got {0}")]
    InvalidSteadiness(u32),

    /// Monochrome rotation outside 0-90°
    #[error("Rotation must be between 0 and 90 degrees, got {0}")]
    InvalidRotation(f64),

    /// Channel that is never screened
    #[error("Channel {0} has no halftone screen")]
    UnscreenedChannel(Channel),

    /// Render target could not be allocated
    #[error("Cannot allocate a {width}x{height} render target")]
    Canvas {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Layer host failure
    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),
}

/// Result type for halftone operations
pub type Result<T> = std::result::Result<T, HalftoneError>;

/// Style options shared by every channel of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleConfig {
    /// Dot shape
    pub dot_shape: DotShape,
    /// Cell size in pixels (1-256)
    pub dot_size: f64,
    /// Extra spacing between cells, percent of the dot size (-50-100)
    pub adjustment: f64,
    /// Jitter divisor (1-20); below 10 dots are randomly perturbed
    pub steadiness: u32,
    /// Pixels read per cell
    pub sampling: Sampling,
    /// Edge quality
    pub antialiasing: Antialiasing,
    /// Desaturation method of the monochrome mode
    pub mono_desaturate: DesaturateMethod,
    /// Screen angle of the monochrome mode, degrees (0-90)
    pub mono_rotation: f64,
    /// Ink color of the monochrome mode
    pub foreground: Color,
    /// Paper color of the monochrome mode
    pub background: Color,
    /// Leave the monochrome paper transparent
    pub transparent_background: bool,
    /// Screen angles of the process inks
    pub screen_angles: ScreenAngles,
    /// Jitter seed, `None` to seed from entropy
    pub seed: Option<u64>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            dot_shape: DotShape::Circle,
            dot_size: 8.0,
            adjustment: 0.0,
            steadiness: STEADINESS_STABLE,
            sampling: Sampling::Medium,
            antialiasing: Antialiasing::Normal,
            mono_desaturate: DesaturateMethod::Average,
            mono_rotation: 45.0,
            foreground: Color::BLACK,
            background: Color::WHITE,
            transparent_background: false,
            screen_angles: ScreenAngles::Us,
            seed: None,
        }
    }
}

impl StyleConfig {
    /// Check every value against its allowed range
    pub fn validate(&self) -> Result<()> {
        if !(1.0..=256.0).contains(&self.dot_size) {
            return Err(HalftoneError::InvalidDotSize(self.dot_size));
        }
        if !(-50.0..=100.0).contains(&self.adjustment) {
            return Err(HalftoneError::InvalidAdjustment(self.adjustment));
        }
        if !(1..=20).contains(&self.steadiness) {
            return Err(HalftoneError::InvalidSteadiness(self.steadiness));
        }
        if !(0.0..=90.0).contains(&self.mono_rotation) {
            return Err(HalftoneError::InvalidRotation(self.mono_rotation));
        }
        Ok(())
    }
}

/// Effective parameters of one channel's screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalftoneParams {
    /// Dot color
    pub foreground: Color,
    /// Canvas fill before drawing
    pub background: Color,
    /// Rotation of the sampling grid, degrees
    pub grid_rotation: f64,
    /// Rotation of line shapes about their cell, degrees
    pub line_angle: f64,
}

impl HalftoneParams {
    /// Parameters of `channel` under `style`
    pub fn resolve(style: &StyleConfig, channel: Channel) -> Result<Self> {
        if channel == Channel::Mono {
            let background = if style.transparent_background {
                Color::TRANSPARENT
            } else {
                style.background
            };
            // A quarter turn gives the same grid as no turn
            let grid_rotation = if style.mono_rotation == 90.0 {
                0.0
            } else {
                style.mono_rotation
            };
            return Ok(Self {
                foreground: style.foreground,
                background,
                grid_rotation,
                line_angle: -style.mono_rotation,
            });
        }

        let (Some(ink), Some(angle)) = (channel.ink(), style.screen_angles.angle(channel)) else {
            return Err(HalftoneError::UnscreenedChannel(channel));
        };

        Ok(Self {
            foreground: ink,
            background: Color::WHITE,
            grid_rotation: angle,
            line_angle: -angle,
        })
    }
}

/// Dot planned for one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotPlacement {
    /// Center in layer pixel coordinates
    pub center: (f64, f64),
    /// Radius before jitter
    pub radius: f64,
}

/// Halftone screen of one channel
#[derive(Debug, Clone)]
pub struct HalftonePass {
    style: StyleConfig,
    channel: Channel,
    params: HalftoneParams,
}

impl HalftonePass {
    /// Create the pass for `channel`
    pub fn new(style: &StyleConfig, channel: Channel) -> Result<Self> {
        style.validate()?;
        let params = HalftoneParams::resolve(style, channel)?;
        Ok(Self {
            style: *style,
            channel,
            params,
        })
    }

    /// Effective parameters
    pub fn params(&self) -> &HalftoneParams {
        &self.params
    }

    fn grid(&self, width: u32, height: u32) -> SamplingGrid {
        SamplingGrid::new(
            width,
            height,
            self.style.dot_size,
            self.style.adjustment,
            self.params.grid_rotation,
        )
    }

    /// Sampling window edge, in whole pixels
    fn window(&self) -> u32 {
        self.style.dot_size as u32
    }

    /// Dots the screen would draw over `source`, in drawing order
    ///
    /// Cells that are skipped or have zero darkness are left out.
    pub fn plan_dots(&self, source: &RgbaImage) -> Vec<DotPlacement> {
        let grid = self.grid(source.width(), source.height());

        grid.cells()
            .filter_map(|cell| {
                let darkness = sample_darkness(source, cell.source, self.window(), self.style.sampling)?;
                let radius = dot_radius(darkness, self.style.dot_shape, self.style.dot_size);
                (radius > 0.0).then_some(DotPlacement {
                    center: cell.source,
                    radius,
                })
            })
            .collect()
    }

    /**
     * Render the screen of `source` into a new buffer of the same size
     *
     * Ticks `progress` exactly `HALFTONE_STEPS` times.
     */
    pub fn render(&self, source: &RgbaImage, progress: &mut dyn Progress) -> Result<RgbaImage> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            tick(progress, HALFTONE_STEPS);
            return Ok(source.clone());
        }

        let grid = self.grid(width, height);
        debug!(
            "Screening {} at {}°: {}x{} cells, pitch {:.2}",
            self.channel,
            self.params.grid_rotation,
            grid.columns(),
            grid.rows(),
            grid.pitch()
        );

        let mut pixmap = Pixmap::new(width, height).ok_or(HalftoneError::Canvas { width, height })?;
        pixmap.fill(self.params.background.to_skia());

        let jitter = Jitter::new(self.style.steadiness, self.style.seed);
        let mut renderer = DotRenderer::new(
            self.style.dot_shape,
            self.style.dot_size,
            self.params.line_angle,
            !is_axis_aligned(self.params.grid_rotation),
            self.params.foreground,
            self.style.antialiasing,
            jitter,
        );

        let total = grid.len();
        let window = self.window();
        let mut reported = 0;
        let mut drawn = 0usize;

        for (index, cell) in grid.cells().enumerate() {
            if let Some(darkness) = sample_darkness(source, cell.source, window, self.style.sampling) {
                let radius = dot_radius(darkness, self.style.dot_shape, self.style.dot_size);
                if radius > 0.0 {
                    renderer.render_dot(&mut pixmap, cell.source, radius);
                    drawn += 1;
                }
            }

            let stage = (index + 1) * HALFTONE_STEPS / total;
            if stage > reported {
                tick(progress, stage - reported);
                reported = stage;
            }
        }
        tick(progress, HALFTONE_STEPS.saturating_sub(reported));

        debug!("Screened {}: {} dots drawn", self.channel, drawn);

        Ok(pixmap_to_image(&pixmap))
    }

    /// Screen a layer of `host` in place
    pub fn apply<H: LayerHost + ?Sized>(
        &self,
        host: &mut H,
        layer: LayerId,
        progress: &mut dyn Progress,
    ) -> Result<()> {
        let bounds = host.bounds(layer)?;
        if bounds.is_empty() {
            tick(progress, HALFTONE_STEPS);
            return Ok(());
        }

        let source = host.read_pixels(layer, bounds)?;
        let screened = self.render(&source, progress)?;
        host.write_pixels(layer, bounds.x, bounds.y, &screened)?;

        if self.style.antialiasing == Antialiasing::Soft {
            host.apply_filter(layer, &Filter::SOFT_BLUR, bounds)?;
        }

        Ok(())
    }
}

fn tick(progress: &mut dyn Progress, steps: usize) {
    for _ in 0..steps {
        progress.step();
    }
}

/// Un-premultiplied copy of a pixmap
fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, premultiplied) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = premultiplied.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}
