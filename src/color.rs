/**
 * Colors
 *
 * 8-bit RGBA color values used for inks, fill layers and halftone
 * foreground/background. Includes hex parsing for the command line and the
 * four process-ink presets used by the color separation modes.
 */

use image::Rgba;
use thiserror::Error;

/// RGBA color representation (straight, not premultiplied, alpha)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0 = transparent, 255 = opaque)
    pub a: u8,
}

/// Error types for color parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// Invalid hex color string format
    #[error("Invalid hex color: {0}")]
    InvalidHexColor(String),
}

/// Result type for color operations
pub type Result<T> = std::result::Result<T, ColorError>;

impl Color {
    /// Opaque black, also the K ink
    pub const BLACK: Color = Color::new(0, 0, 0);
    /// Opaque white
    pub const WHITE: Color = Color::new(255, 255, 255);
    /// Fully transparent
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Cyan ink
    pub const CYAN: Color = Color::new(0, 255, 255);
    /// Magenta ink
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    /// Yellow ink
    pub const YELLOW: Color = Color::new(255, 255, 0);

    /// Create a new opaque color from RGB values
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a new color from RGBA values
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string ("#FF0000", "FF0000" or "#FF000080")
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim_start_matches('#');

        if hex.len() != 6 && hex.len() != 8 {
            return Err(ColorError::InvalidHexColor(hex.to_string()));
        }

        let component = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| ColorError::InvalidHexColor(hex.to_string()))
        };

        let r = component(0..2)?;
        let g = component(2..4)?;
        let b = component(4..6)?;
        let a = if hex.len() == 8 { component(6..8)? } else { 255 };

        Ok(Self { r, g, b, a })
    }

    /// Format as "#rrggbb", with an alpha byte appended when not opaque
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// True when the color is fully transparent
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Pixel value for `image` buffers
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// Color value for the `tiny-skia` rasterizer
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let black = Color::from_hex("#000000").unwrap();
        assert_eq!(black, Color::BLACK);

        let white = Color::from_hex("#ffffff").unwrap();
        assert_eq!(white, Color::WHITE);

        // Without # prefix, upper case
        let cyan = Color::from_hex("00FFFF").unwrap();
        assert_eq!(cyan, Color::CYAN);

        // With alpha
        let half = Color::from_hex("#ff000080").unwrap();
        assert_eq!(half, Color::rgba(255, 0, 0, 128));
    }

    #[test]
    fn test_color_from_hex_invalid() {
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#fffffff").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("").is_err());
        // Multi-byte characters must not panic on slicing
        assert!(Color::from_hex("ééé").is_err());
    }

    #[test]
    fn test_color_hex_formatting() {
        assert_eq!(Color::MAGENTA.to_hex(), "#ff00ff");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_hex(), "#01020304");
        assert_eq!(Color::from_hex(&Color::YELLOW.to_hex()).unwrap(), Color::YELLOW);
    }

    #[test]
    fn test_ink_presets() {
        assert_eq!(Color::CYAN, Color::new(0, 255, 255));
        assert_eq!(Color::MAGENTA, Color::new(255, 0, 255));
        assert_eq!(Color::YELLOW, Color::new(255, 255, 0));
        assert!(Color::TRANSPARENT.is_transparent());
        assert!(!Color::BLACK.is_transparent());
    }

    #[test]
    fn test_rgba_conversion() {
        let color = Color::rgba(10, 20, 30, 40);
        assert_eq!(color.to_rgba(), Rgba([10, 20, 30, 40]));
        assert_eq!(Color::from(Rgba([10, 20, 30, 40])), color);
    }
}
