/**
 * Layer Host
 *
 * The capabilities the separation pipeline needs from a host application's
 * document model: a stack of layers inside group containers, per-layer
 * compositing properties, pixel access and filters.
 *
 * Children of a group are ordered bottom to top. "Above" always means
 * "composited after". A `Document` provides an in-memory implementation;
 * an editor integration implements the same trait over its own node API.
 */

use std::fmt;

use image::RgbaImage;
use thiserror::Error;

use crate::color::Color;
use crate::filter::Filter;

/// Handle to a layer or group owned by a layer host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u32);

impl LayerId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric id
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integer pixel rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// True when the rectangle contains no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, (right - x as i64) as u32, (bottom - y as i64) as u32)
    }

    /// Check whether a canvas pixel lies inside
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64 && x < self.right() && y >= self.y as i64 && y < self.bottom()
    }
}

/// How a layer composites with what lies beneath it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Source over
    #[default]
    Normal,
    /// Sum, clamped to white
    Add,
    /// Product
    Multiply,
    /// Destination divided by source
    Divide,
    /// Converse implication: destination OR NOT source, bitwise
    Converse,
}

impl BlendMode {
    /// Blend one normalized channel of `src` onto `dst`
    #[inline]
    pub fn blend(self, src: f32, dst: f32) -> f32 {
        match self {
            BlendMode::Normal => src,
            BlendMode::Add => (src + dst).min(1.0),
            BlendMode::Multiply => src * dst,
            BlendMode::Divide => {
                if src <= 0.0 {
                    if dst <= 0.0 {
                        0.0
                    } else {
                        1.0
                    }
                } else {
                    (dst / src).min(1.0)
                }
            }
            BlendMode::Converse => {
                let s = (src * 255.0).round() as u8;
                let d = (dst * 255.0).round() as u8;
                (!s | d) as f32 / 255.0
            }
        }
    }

    /// Host-side name of the mode
    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Add => "add",
            BlendMode::Multiply => "multiply",
            BlendMode::Divide => "divide",
            BlendMode::Converse => "converse",
        }
    }
}

/// Error types for layer host operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// No layer with this id
    #[error("Unknown layer {0}")]
    UnknownLayer(LayerId),

    /// Pixel operation on a group
    #[error("Layer {0} is a group, not a paint layer")]
    NotAPaintLayer(LayerId),

    /// Child operation on a paint layer
    #[error("Layer {0} is not a group")]
    NotAGroup(LayerId),

    /// Merge down of the bottom layer of a group
    #[error("Layer {0} has no layer beneath it to merge with")]
    NothingBelow(LayerId),

    /// The document root cannot be removed, moved or merged
    #[error("Operation not allowed on the document root")]
    RootLayer,

    /// The host cannot perform the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for layer host operations
pub type Result<T> = std::result::Result<T, LayerError>;

/// Document/layer capabilities consumed by the separation pipeline
pub trait LayerHost {
    /// Canvas width and height in pixels
    fn canvas_size(&self) -> (u32, u32);

    /// Layer name
    fn layer_name(&self, layer: LayerId) -> Result<String>;

    /// Rename a layer
    fn set_layer_name(&mut self, layer: LayerId, name: &str) -> Result<()>;

    /// True for group containers
    fn is_group(&self, layer: LayerId) -> Result<bool>;

    /// Parent group, `None` for the document root
    fn parent(&self, layer: LayerId) -> Result<Option<LayerId>>;

    /// Children of a group, bottom to top
    fn children(&self, group: LayerId) -> Result<Vec<LayerId>>;

    /// Pixel extent of a paint layer
    fn bounds(&self, layer: LayerId) -> Result<Rect>;

    /// Visibility flag
    fn is_visible(&self, layer: LayerId) -> Result<bool>;

    /// Show or hide a layer
    fn set_visible(&mut self, layer: LayerId, visible: bool) -> Result<()>;

    /// Create an empty group in the parent of `sibling`, directly above it
    fn create_group(&mut self, name: &str, sibling: LayerId) -> Result<LayerId>;

    /// Copy `source` into `group`, above `above` or at the top when `None`
    fn duplicate(&mut self, source: LayerId, group: LayerId, above: Option<LayerId>) -> Result<LayerId>;

    /// Create a canvas-size layer of a uniform color, placed like `duplicate`
    fn create_fill(&mut self, color: Color, group: LayerId, above: Option<LayerId>) -> Result<LayerId>;

    /// Delete a layer (and its children)
    fn remove(&mut self, layer: LayerId) -> Result<()>;

    /// Composite a layer onto the one beneath it, returns the merged layer
    fn merge_down(&mut self, layer: LayerId) -> Result<LayerId>;

    /// Make the layer extent exactly `rect`
    fn crop(&mut self, layer: LayerId, rect: Rect) -> Result<()>;

    /// Compositing mode
    fn set_blend_mode(&mut self, layer: LayerId, mode: BlendMode) -> Result<()>;

    /// Layer opacity, 0-255
    fn set_opacity(&mut self, layer: LayerId, opacity: u8) -> Result<()>;

    /// Copy out a region of a paint layer; areas outside the layer are transparent
    fn read_pixels(&self, layer: LayerId, rect: Rect) -> Result<RgbaImage>;

    /// Overwrite a region of a paint layer with `pixels` placed at (x, y)
    fn write_pixels(&mut self, layer: LayerId, x: i32, y: i32, pixels: &RgbaImage) -> Result<()>;

    /// Run a filter over a region of a paint layer
    fn apply_filter(&mut self, layer: LayerId, filter: &Filter, rect: Rect) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blend_u8(mode: BlendMode, src: u8, dst: u8) -> u8 {
        (mode.blend(src as f32 / 255.0, dst as f32 / 255.0) * 255.0).round() as u8
    }

    #[test]
    fn test_blend_add() {
        assert_eq!(blend_u8(BlendMode::Add, 100, 100), 200);
        assert_eq!(blend_u8(BlendMode::Add, 200, 100), 255);
    }

    #[test]
    fn test_blend_multiply() {
        assert_eq!(blend_u8(BlendMode::Multiply, 255, 77), 77);
        assert_eq!(blend_u8(BlendMode::Multiply, 0, 77), 0);
        assert_eq!(blend_u8(BlendMode::Multiply, 128, 128), 64);
    }

    #[test]
    fn test_blend_divide() {
        assert_eq!(blend_u8(BlendMode::Divide, 255, 77), 77);
        assert_eq!(blend_u8(BlendMode::Divide, 51, 17), 85);
        // Division by black: white unless the destination is black too
        assert_eq!(blend_u8(BlendMode::Divide, 0, 77), 255);
        assert_eq!(blend_u8(BlendMode::Divide, 0, 0), 0);
        // Clamped
        assert_eq!(blend_u8(BlendMode::Divide, 64, 200), 255);
    }

    #[test]
    fn test_blend_converse() {
        assert_eq!(blend_u8(BlendMode::Converse, 255, 0), 0);
        assert_eq!(blend_u8(BlendMode::Converse, 0, 0), 255);
        assert_eq!(blend_u8(BlendMode::Converse, 255, 77), 77);
        assert_eq!(blend_u8(BlendMode::Converse, 0xF0, 0x0C), 0x0F | 0x0C);
    }

    #[test]
    fn test_blend_normal() {
        assert_eq!(blend_u8(BlendMode::Normal, 12, 240), 12);
    }

    #[test]
    fn test_rect_union_and_contains() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(-5, 4, 8, 20);
        let union = a.union(&b);
        assert_eq!(union, Rect::new(-5, 0, 15, 24));
        assert!(union.contains(-5, 23));
        assert!(!union.contains(10, 0));
        assert_eq!(Rect::default().union(&a), a);
        assert!(Rect::from_size(0, 4).is_empty());
    }

    #[test]
    fn test_layer_id_display() {
        assert_eq!(LayerId::new(7).to_string(), "#7");
        assert_eq!(LayerId::new(7).id(), 7);
    }
}
