//! Newsprint
//!
//! Newspaper-style halftone rendering: a continuous-tone image becomes a
//! pattern of dots, diamonds, squares or lines whose size encodes the local
//! darkness, optionally separated into cyan, magenta, yellow and black
//! plates screened at different angles.
//!
//! # Features
//!
//! - Rotated sampling grids with alpha-aware darkness sampling
//! - Five dot shapes, optional jitter and three antialiasing levels
//! - Monochrome (six desaturation methods), CMY, CMYK, CMY+rK and two
//!   comics-oriented CMY+K separations
//! - Declarative per-mode recipes run against any [`LayerHost`]
//! - An in-memory [`Document`] host with blend modes, merge-down and filters
//! - Reproducible results with seeded jitter
//!
//! # Quick Start
//!
//! ## Separating an Image
//!
//! ```no_run
//! use newsprint::{Document, NoProgress, OutputMode, Separation, SeparationOptions, StyleConfig};
//!
//! let image = image::open("photo.jpg").unwrap().to_rgba8();
//! let (mut document, source) = Document::from_image("photo", image);
//!
//! let options = SeparationOptions {
//!     mode: OutputMode::Cmyk,
//!     style: StyleConfig {
//!         dot_size: 6.0,
//!         seed: Some(42),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! let separation = Separation::new(options).unwrap();
//! let result = separation.process(&mut document, source, &mut NoProgress).unwrap();
//!
//! for channel in &result.channels {
//!     let layer = document.layer_image(channel.layer).unwrap();
//!     layer.save(format!("{}.png", channel.name)).unwrap();
//! }
//! document.render_group(result.group).unwrap().save("composite.png").unwrap();
//! ```
//!
//! ## Screening a Single Layer
//!
//! ```no_run
//! use newsprint::{Channel, HalftonePass, NoProgress, StyleConfig};
//!
//! let gray = image::open("gray.png").unwrap().to_rgba8();
//! let pass = HalftonePass::new(&StyleConfig::default(), Channel::Mono).unwrap();
//! let screened = pass.render(&gray, &mut NoProgress).unwrap();
//! screened.save("screened.png").unwrap();
//! ```
//!
//! # Algorithm
//!
//! A halftone pass works in 3 stages:
//!
//! 1. **Grid**: cell centers are laid out at `size + size * adjustment / 100`
//!    pitch over the bounding box of the rotated layer
//! 2. **Sampling**: each center is mapped back to source coordinates and the
//!    covered pixels are averaged into a darkness value, weighted by alpha
//! 3. **Rendering**: a dot scaled by darkness is drawn at the rotated center
//!    on a canvas pre-filled with the background
//!
//! Color modes extract each plate by adding the ink color to the source and
//! keeping the minimum component, then screen it at the ink's angle.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// RGBA colors and ink presets
pub mod color;
/// In-memory layer host
pub mod document;
/// Desaturate and blur filters
pub mod filter;
/// Sampling grid math
pub mod geometry;
/// Halftone pass over one layer
pub mod halftone;
/// Layer host abstraction
pub mod layer;
/// Output mode registry
pub mod modes;
/// Name templates
pub mod naming;
/// Channel separation pipeline
pub mod pipeline;
/// Progress reporting
pub mod progress;
/// Recipe model
pub mod recipe;
/// Dot rendering
pub mod render;
/// Darkness sampling
pub mod sampler;

// Re-export main types for convenience
pub use color::{Color, ColorError};
pub use document::Document;
pub use filter::{DesaturateMethod, Filter};
pub use halftone::{HalftoneError, HalftoneParams, HalftonePass, StyleConfig};
pub use layer::{BlendMode, LayerError, LayerHost, LayerId, Rect};
pub use modes::{OutputMode, ScreenAngles};
pub use pipeline::{
    process, ChannelLayer, OriginalLayerAction, Separation, SeparationError, SeparationOptions,
    SeparationResult,
};
pub use progress::{NoProgress, Progress};
pub use recipe::{Channel, ChannelSpec, Operation, OutputModeDescriptor, RecipeError, SourceRef};
pub use render::{Antialiasing, DotShape};
pub use sampler::Sampling;
