/**
 * Example: CMYK separation through the in-memory document
 *
 * Builds a synthetic color wheel, separates it with every output mode and
 * saves each channel layer plus the composite.
 *
 * Run with:
 *   cargo run --example separate_channels
 */

use image::{Rgba, RgbaImage};
use newsprint::{Document, OutputMode, Separation, SeparationOptions, StyleConfig};

fn create_color_wheel(size: u32) -> RgbaImage {
    let center = size as f64 / 2.0;

    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f64 - center;
        let dy = y as f64 - center;
        let distance = (dx * dx + dy * dy).sqrt() / center;
        if distance > 1.0 {
            return Rgba([255, 255, 255, 255]);
        }

        // Hue around the center, value falling off towards the rim
        let hue = (dy.atan2(dx).to_degrees() + 360.0) % 360.0;
        let value = 1.0 - distance * 0.6;
        let sector = hue / 60.0;
        let fraction = sector - sector.floor();
        let (r, g, b) = match sector as u32 {
            0 => (1.0, fraction, 0.0),
            1 => (1.0 - fraction, 1.0, 0.0),
            2 => (0.0, 1.0, fraction),
            3 => (0.0, 1.0 - fraction, 1.0),
            4 => (fraction, 0.0, 1.0),
            _ => (1.0, 0.0, 1.0 - fraction),
        };
        let channel = |c: f64| (c * value * 255.0).round() as u8;
        Rgba([channel(r), channel(g), channel(b), 255])
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Newsprint Separation Example\n");

    let wheel = create_color_wheel(256);
    wheel.save("example-wheel.png")?;
    println!("Created example-wheel.png\n");

    for mode in OutputMode::ALL {
        let separation = Separation::new(SeparationOptions {
            mode,
            style: StyleConfig {
                dot_size: 6.0,
                seed: Some(7),
                ..StyleConfig::default()
            },
            ..SeparationOptions::default()
        })?;

        println!("{}", separation.descriptor().label);
        let (mut document, source) = Document::from_image("wheel", wheel.clone());
        let mut progress = newsprint::progress::progress_bar();
        let result = separation.process(&mut document, source, &mut progress)?;

        for channel in &result.channels {
            let path = format!("example-{}.png", channel.name);
            document.layer_image(channel.layer)?.save(&path)?;
            println!("  ✓ {} -> {}", channel.channel, path);
        }

        let composite = format!("example-{}.png", result.group_name);
        document.flatten()?.save(&composite)?;
        println!("  ✓ composite -> {}\n", composite);
    }

    println!("✓ All examples completed!");

    Ok(())
}
