/**
 * Example: Screen a gradient with every dot shape
 *
 * Renders a horizontal black-to-white gradient once per dot shape, plus
 * a jittered and a sepia version, without going through a layer host.
 *
 * Run with:
 *   cargo run --example halftone_gradient
 */

use image::{Rgba, RgbaImage};
use newsprint::{Channel, Color, DotShape, HalftonePass, NoProgress, StyleConfig};

fn create_gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        let value = (x * 255 / (width - 1)) as u8;
        Rgba([value, value, value, 255])
    })
}

fn render(
    gradient: &RgbaImage,
    style: StyleConfig,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let pass = HalftonePass::new(&style, Channel::Mono)?;
    pass.render(gradient, &mut NoProgress)?.save(path)?;
    println!("  ✓ Saved to {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Newsprint Gradient Example\n");

    let gradient = create_gradient(512, 128);

    println!("Step 1: One screen per dot shape...");
    let shapes = [
        (DotShape::Circle, "circle"),
        (DotShape::Diamond, "diamond"),
        (DotShape::Square, "square"),
        (DotShape::FlatLine, "flat-line"),
        (DotShape::RoundLine, "round-line"),
    ];
    for (shape, name) in shapes {
        let style = StyleConfig {
            dot_shape: shape,
            dot_size: 10.0,
            ..StyleConfig::default()
        };
        render(&gradient, style, &format!("example-gradient-{}.png", name))?;
    }
    println!();

    println!("Step 2: Jittered dots (steadiness 3, seeded)...");
    let jittered = StyleConfig {
        steadiness: 3,
        seed: Some(42),
        ..StyleConfig::default()
    };
    render(&gradient, jittered, "example-gradient-jitter.png")?;
    println!();

    println!("Step 3: Sepia ink on cream paper, unrotated...");
    let sepia = StyleConfig {
        foreground: Color::from_hex("#704214")?,
        background: Color::from_hex("#f4e8d8")?,
        mono_rotation: 0.0,
        adjustment: 25.0,
        ..StyleConfig::default()
    };
    render(&gradient, sepia, "example-gradient-sepia.png")?;
    println!();

    println!("✓ All examples completed!");

    Ok(())
}
