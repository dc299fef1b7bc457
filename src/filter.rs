/**
 * Pixel Filters
 *
 * The two filters the separation recipes need from a layer host:
 *
 * - Desaturate: collapse RGB to a single gray value with one of six
 *   methods. Alpha is untouched.
 * - Gaussian blur: spatial convolution with independent horizontal and
 *   vertical radii. Edges are clamped rather than wrapped, and colors are
 *   weighted by alpha so transparent pixels do not bleed black.
 */

use image::{Rgba, RgbaImage};

/// Method used to reduce RGB to gray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DesaturateMethod {
    /// (max + min) / 2
    Lightness,
    /// ITU-R BT.709 weights
    Luminosity709,
    /// ITU-R BT.601 weights
    Luminosity601,
    /// (r + g + b) / 3
    #[default]
    Average,
    /// Smallest component
    Minimum,
    /// Largest component
    Maximum,
}

impl DesaturateMethod {
    /// All methods, in registry order
    pub const ALL: [DesaturateMethod; 6] = [
        DesaturateMethod::Lightness,
        DesaturateMethod::Luminosity709,
        DesaturateMethod::Luminosity601,
        DesaturateMethod::Average,
        DesaturateMethod::Minimum,
        DesaturateMethod::Maximum,
    ];

    /// Gray value for an RGB triple
    #[inline]
    pub fn gray(self, r: u8, g: u8, b: u8) -> u8 {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let value = match self {
            DesaturateMethod::Lightness => (rf.max(gf).max(bf) + rf.min(gf).min(bf)) / 2.0,
            DesaturateMethod::Luminosity709 => 0.2126 * rf + 0.7152 * gf + 0.0722 * bf,
            DesaturateMethod::Luminosity601 => 0.299 * rf + 0.587 * gf + 0.114 * bf,
            DesaturateMethod::Average => (rf + gf + bf) / 3.0,
            DesaturateMethod::Minimum => return r.min(g).min(b),
            DesaturateMethod::Maximum => return r.max(g).max(b),
        };
        value.round().clamp(0.0, 255.0) as u8
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            DesaturateMethod::Lightness => "Lightness",
            DesaturateMethod::Luminosity709 => "Luminosity (ITU-R BT.709)",
            DesaturateMethod::Luminosity601 => "Luminosity (ITU-R BT.601)",
            DesaturateMethod::Average => "Average",
            DesaturateMethod::Minimum => "Minimum",
            DesaturateMethod::Maximum => "Maximum",
        }
    }
}

/// A parameterized filter applied by a layer host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    /// Reduce colors to gray
    Desaturate(DesaturateMethod),
    /// Gaussian blur with per-axis radii, in pixels
    GaussianBlur {
        /// Horizontal radius
        horizontal: f32,
        /// Vertical radius
        vertical: f32,
    },
}

impl Filter {
    /// Blur used by soft antialiasing
    pub const SOFT_BLUR: Filter = Filter::GaussianBlur {
        horizontal: 0.67,
        vertical: 0.67,
    };

    /// Apply the filter to a pixel buffer in place
    pub fn apply(&self, image: &mut RgbaImage) {
        match *self {
            Filter::Desaturate(method) => desaturate(image, method),
            Filter::GaussianBlur {
                horizontal,
                vertical,
            } => *image = gaussian_blur(image, horizontal, vertical),
        }
    }
}

/// Desaturate a buffer in place
pub fn desaturate(image: &mut RgbaImage, method: DesaturateMethod) {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let gray = method.gray(r, g, b);
        *pixel = Rgba([gray, gray, gray, a]);
    }
}

/**
 * Gaussian blur by direct spatial convolution
 *
 * The kernel extends to three standard deviations on each axis, the radius
 * being used as the standard deviation. A radius of zero leaves that axis
 * unblurred.
 */
pub fn gaussian_blur(image: &RgbaImage, horizontal: f32, vertical: f32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let kernel_x = gaussian_kernel(horizontal);
    let kernel_y = gaussian_kernel(vertical);
    let radius_x = (kernel_x.len() / 2) as i64;
    let radius_y = (kernel_y.len() / 2) as i64;

    let mut blurred = RgbaImage::new(width, height);

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut color = [0.0f32; 3];
            let mut alpha = 0.0f32;
            let mut weight_sum = 0.0f32;

            for (ky, wy) in kernel_y.iter().enumerate() {
                // Clamp coordinates to the edge
                let py = (y + ky as i64 - radius_y).clamp(0, height as i64 - 1) as u32;

                for (kx, wx) in kernel_x.iter().enumerate() {
                    let px = (x + kx as i64 - radius_x).clamp(0, width as i64 - 1) as u32;

                    let weight = wx * wy;
                    let pixel = image.get_pixel(px, py);
                    let a = pixel[3] as f32 * weight;

                    for (channel, value) in color.iter_mut().enumerate() {
                        *value += pixel[channel] as f32 * a;
                    }
                    alpha += a;
                    weight_sum += weight;
                }
            }

            let out = if alpha > 0.0 {
                let channel = |c: usize| (color[c] / alpha).round().clamp(0.0, 255.0) as u8;
                let a = (alpha / weight_sum).round().clamp(0.0, 255.0) as u8;
                Rgba([channel(0), channel(1), channel(2), a])
            } else {
                Rgba([0, 0, 0, 0])
            };

            blurred.put_pixel(x as u32, y as u32, out);
        }
    }

    blurred
}

/// Normalized 1-D gaussian weights
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }

    let radius = (3.0 * sigma).ceil() as i32;
    let divisor = 2.0 * sigma * sigma;

    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|k| (-((k * k) as f32) / divisor).exp())
        .collect();

    let sum: f32 = kernel.iter().sum();
    for weight in kernel.iter_mut() {
        *weight /= sum;
    }

    kernel
}
