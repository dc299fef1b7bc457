/**
 * Newsprint CLI - Newspaper halftone and color separation from the command line
 */

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::{Path, PathBuf};

use newsprint::progress::progress_bar;
use newsprint::{
    Antialiasing, Color, DesaturateMethod, Document, DotShape, NoProgress, OriginalLayerAction, OutputMode,
    Progress, Sampling, ScreenAngles, Separation, SeparationOptions, StyleConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Single ink halftone
    Mono,
    /// Cyan, magenta and yellow
    Cmy,
    /// Cyan, magenta, yellow and black, for pictures
    Cmyk,
    /// CMY with an additional black plate (rich black)
    Cmyrk,
    /// CMY with a flat black plate, for comics (method #1)
    Comics1,
    /// CMY with a flat black plate, for comics (method #2)
    Comics2,
}

impl From<ModeArg> for OutputMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Mono => OutputMode::Monochrome,
            ModeArg::Cmy => OutputMode::Cmy,
            ModeArg::Cmyk => OutputMode::Cmyk,
            ModeArg::Cmyrk => OutputMode::CmyRichK,
            ModeArg::Comics1 => OutputMode::CmyKComics1,
            ModeArg::Comics2 => OutputMode::CmyKComics2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DesaturateArg {
    /// (max + min) / 2
    Lightness,
    /// ITU-R BT.709 luminosity
    Luminosity709,
    /// ITU-R BT.601 luminosity
    Luminosity601,
    /// (r + g + b) / 3
    Average,
    /// Smallest component
    Minimum,
    /// Largest component
    Maximum,
}

impl From<DesaturateArg> for DesaturateMethod {
    fn from(method: DesaturateArg) -> Self {
        match method {
            DesaturateArg::Lightness => DesaturateMethod::Lightness,
            DesaturateArg::Luminosity709 => DesaturateMethod::Luminosity709,
            DesaturateArg::Luminosity601 => DesaturateMethod::Luminosity601,
            DesaturateArg::Average => DesaturateMethod::Average,
            DesaturateArg::Minimum => DesaturateMethod::Minimum,
            DesaturateArg::Maximum => DesaturateMethod::Maximum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DotArg {
    Circle,
    Diamond,
    Square,
    FlatLine,
    RoundLine,
}

impl From<DotArg> for DotShape {
    fn from(dot: DotArg) -> Self {
        match dot {
            DotArg::Circle => DotShape::Circle,
            DotArg::Diamond => DotShape::Diamond,
            DotArg::Square => DotShape::Square,
            DotArg::FlatLine => DotShape::FlatLine,
            DotArg::RoundLine => DotShape::RoundLine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SamplingArg {
    Low,
    Medium,
    High,
}

impl From<SamplingArg> for Sampling {
    fn from(sampling: SamplingArg) -> Self {
        match sampling {
            SamplingArg::Low => Sampling::Low,
            SamplingArg::Medium => Sampling::Medium,
            SamplingArg::High => Sampling::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AntialiasingArg {
    None,
    Normal,
    /// Antialiased, then lightly blurred
    Soft,
}

impl From<AntialiasingArg> for Antialiasing {
    fn from(antialiasing: AntialiasingArg) -> Self {
        match antialiasing {
            AntialiasingArg::None => Antialiasing::None,
            AntialiasingArg::Normal => Antialiasing::Normal,
            AntialiasingArg::Soft => Antialiasing::Soft,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnglesArg {
    /// C=15 M=75 Y=0 K=45
    Us,
    /// C=15 M=45 Y=0 K=75
    Eu,
}

impl From<AnglesArg> for ScreenAngles {
    fn from(angles: AnglesArg) -> Self {
        match angles {
            AnglesArg::Us => ScreenAngles::Us,
            AnglesArg::Eu => ScreenAngles::European,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OriginalArg {
    /// Keep its visibility
    Unchanged,
    /// Show it
    Visible,
    /// Hide it
    Hidden,
    /// Leave it out of the composite
    Remove,
}

impl From<OriginalArg> for OriginalLayerAction {
    fn from(action: OriginalArg) -> Self {
        match action {
            OriginalArg::Unchanged => OriginalLayerAction::Unchanged,
            OriginalArg::Visible => OriginalLayerAction::Visible,
            OriginalArg::Hidden => OriginalLayerAction::Hidden,
            OriginalArg::Remove => OriginalLayerAction::Remove,
        }
    }
}

/// Newspaper halftone rendering and CMYK channel separation
#[derive(Parser, Debug)]
#[command(name = "newsprint")]
#[command(version)]
#[command(about = "Newspaper halftone rendering and color separation", long_about = None)]
struct Cli {
    /// Input image path
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the channel layers and the composite
    #[arg(short, long, default_value = "newsprint")]
    output: PathBuf,

    /// Output mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Mono)]
    mode: ModeArg,

    /// Desaturation method of the monochrome mode
    #[arg(short, long, value_enum, default_value_t = DesaturateArg::Average)]
    desaturate: DesaturateArg,

    /// Dot shape
    #[arg(long, value_enum, default_value_t = DotArg::Circle)]
    dot: DotArg,

    /// Dot size in pixels (1-256)
    #[arg(short, long, default_value = "8")]
    size: f64,

    /// Spacing adjustment in percent of the dot size (-50 to 100)
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    adjustment: f64,

    /// Steadiness (1-20, below 10 jitters the dots)
    #[arg(long, default_value = "10")]
    steadiness: u32,

    /// Source pixels read per cell
    #[arg(long, value_enum, default_value_t = SamplingArg::Medium)]
    sampling: SamplingArg,

    /// Dot edge quality
    #[arg(long, value_enum, default_value_t = AntialiasingArg::Normal)]
    antialiasing: AntialiasingArg,

    /// Screen rotation of the monochrome mode in degrees (0-90)
    #[arg(short, long, default_value = "45")]
    rotation: f64,

    /// Monochrome ink color (hex)
    #[arg(short, long, default_value = "#000000")]
    foreground: String,

    /// Monochrome paper color (hex)
    #[arg(short, long, default_value = "#ffffff")]
    background: String,

    /// Transparent monochrome paper
    #[arg(short, long)]
    transparent: bool,

    /// Screen angles of the process inks
    #[arg(long, value_enum, default_value_t = AnglesArg::Us)]
    screen_angles: AnglesArg,

    /// Random seed for reproducible jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Group name template ({mode}, {source:name})
    #[arg(long, default_value = newsprint::naming::DEFAULT_GROUP_TEMPLATE)]
    group_name: String,

    /// Channel layer name template ({mode}, {color:short}, {color:long}, {source:name})
    #[arg(long, default_value = newsprint::naming::DEFAULT_LAYER_TEMPLATE)]
    layer_name: String,

    /// What happens to the source layer in the composite
    #[arg(long, value_enum, default_value_t = OriginalArg::Hidden)]
    original: OriginalArg,

    /// Show progress and log details (-vv for debug output)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn style(&self) -> Result<StyleConfig> {
        let foreground = Color::from_hex(&self.foreground).context("Failed to parse foreground color")?;
        let background = Color::from_hex(&self.background).context("Failed to parse background color")?;

        Ok(StyleConfig {
            dot_shape: self.dot.into(),
            dot_size: self.size,
            adjustment: self.adjustment,
            steadiness: self.steadiness,
            sampling: self.sampling.into(),
            antialiasing: self.antialiasing.into(),
            mono_desaturate: self.desaturate.into(),
            mono_rotation: self.rotation,
            foreground,
            background,
            transparent_background: self.transparent,
            screen_angles: self.screen_angles.into(),
            seed: self.seed,
        })
    }

    fn options(&self) -> Result<SeparationOptions> {
        Ok(SeparationOptions {
            mode: self.mode.into(),
            style: self.style()?,
            group_name: self.group_name.clone(),
            layer_name: self.layer_name.clone(),
            original_layer: self.original.into(),
        })
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// File name for a layer name, path separators replaced
fn file_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    format!("{}.png", stem)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level())).init();

    if !cli.input.exists() {
        anyhow::bail!("Input file does not exist: {}", cli.input.display());
    }

    let options = cli.options()?;
    let separation = Separation::new(options).context("Invalid halftone settings")?;

    println!("Processing: {}", cli.input.display());
    for line in summary(&separation) {
        println!("{}", line);
    }
    if let Some(seed) = cli.seed {
        println!("Seed: {}", seed);
    }
    println!("Output: {}", cli.output.display());
    println!();

    let image = image::open(&cli.input)
        .with_context(|| format!("Failed to open image: {}", cli.input.display()))?
        .to_rgba8();

    let source_name = cli
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Background".to_string());
    let (mut document, source) = Document::from_image(&source_name, image);

    let mut progress: Box<dyn Progress> = if cli.verbose > 0 {
        Box::new(progress_bar())
    } else {
        Box::new(NoProgress)
    };

    let result = separation
        .process(&mut document, source, progress.as_mut())
        .context("Failed to separate image")?;

    std::fs::create_dir_all(&cli.output).context("Failed to create output directory")?;

    for channel in &result.channels {
        let path = cli.output.join(file_name(&channel.name));
        document
            .layer_image(channel.layer)
            .context("Failed to read channel layer")?
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        println!("Channel {:>4}: {}", channel.channel.short(), path.display());
    }

    let composite = composite_path(&cli.output, &result.group_name);
    document
        .flatten()
        .context("Failed to flatten document")?
        .save(&composite)
        .with_context(|| format!("Failed to save {}", composite.display()))?;
    println!("Composite: {}", composite.display());

    println!();
    println!("Done!");

    Ok(())
}

/// Settings lines printed before a run
fn summary(separation: &Separation) -> Vec<String> {
    let options = separation.options();
    let style = &options.style;
    let descriptor = separation.descriptor();

    let mut lines = vec![
        format!("Mode: {}", descriptor.label),
        format!("      {}", descriptor.description),
        format!(
            "Dot: {} {}px, adjustment {}%",
            style.dot_shape.label(),
            style.dot_size,
            style.adjustment
        ),
        format!("Sampling: {}", style.sampling.label()),
    ];

    if options.mode.is_color() {
        lines.push(format!("Screen angles: {}", style.screen_angles.label()));
    } else {
        let paper = if style.transparent_background {
            "transparent".to_string()
        } else {
            style.background.to_hex()
        };
        lines.push(format!("Desaturate: {}", style.mono_desaturate.label()));
        lines.push(format!(
            "Ink: {} on {}, rotation {}°",
            style.foreground.to_hex(),
            paper,
            style.mono_rotation
        ));
    }

    lines
}

fn composite_path(output: &Path, group_name: &str) -> PathBuf {
    output.join(file_name(group_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_style_defaults() {
        let cli = Cli::try_parse_from(["newsprint", "-i", "in.png"]).unwrap();
        let options = cli.options().unwrap();

        let defaults = SeparationOptions::default();
        assert_eq!(options.style, StyleConfig::default());
        assert_eq!(options.mode, defaults.mode);
        assert_eq!(options.group_name, defaults.group_name);
        assert_eq!(options.layer_name, defaults.layer_name);
        assert_eq!(options.original_layer, defaults.original_layer);
        assert_eq!(cli.output, PathBuf::from("newsprint"));
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_style_arguments() {
        let cli = Cli::try_parse_from([
            "newsprint",
            "-i",
            "in.png",
            "--mode",
            "comics2",
            "--dot",
            "round-line",
            "--size",
            "12",
            "--adjustment",
            "-20",
            "--steadiness",
            "3",
            "--sampling",
            "high",
            "--antialiasing",
            "soft",
            "--rotation",
            "30",
            "--foreground",
            "#ff0000",
            "--background",
            "00ff0080",
            "--transparent",
            "--screen-angles",
            "eu",
            "--seed",
            "99",
            "--original",
            "remove",
            "-vv",
        ])
        .unwrap();
        let options = cli.options().unwrap();

        assert_eq!(options.mode, OutputMode::CmyKComics2);
        assert_eq!(options.original_layer, OriginalLayerAction::Remove);
        let style = options.style;
        assert_eq!(style.dot_shape, DotShape::RoundLine);
        assert_eq!(style.dot_size, 12.0);
        assert_eq!(style.adjustment, -20.0);
        assert_eq!(style.steadiness, 3);
        assert_eq!(style.sampling, Sampling::High);
        assert_eq!(style.antialiasing, Antialiasing::Soft);
        assert_eq!(style.mono_rotation, 30.0);
        assert_eq!(style.foreground, Color::new(255, 0, 0));
        assert_eq!(style.background, Color::rgba(0, 255, 0, 128));
        assert!(style.transparent_background);
        assert_eq!(style.screen_angles, ScreenAngles::European);
        assert_eq!(style.seed, Some(99));
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn test_desaturate_selects_monochrome_recipe() {
        let cli = Cli::try_parse_from(["newsprint", "-i", "in.png", "-d", "luminosity709"]).unwrap();
        let separation = Separation::new(cli.options().unwrap()).unwrap();
        assert_eq!(separation.options().style.mono_desaturate, DesaturateMethod::Luminosity709);
        assert_eq!(separation.descriptor().label, "Monochrome");
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Cli::try_parse_from(["newsprint"]).is_err());
        assert!(Cli::try_parse_from(["newsprint", "-i", "in.png", "--mode", "rgb"]).is_err());

        let cli = Cli::try_parse_from(["newsprint", "-i", "in.png", "--foreground", "nope"]).unwrap();
        assert!(cli.options().is_err());

        let cli = Cli::try_parse_from(["newsprint", "-i", "in.png", "--size", "0"]).unwrap();
        assert!(Separation::new(cli.options().unwrap()).is_err());
    }

    #[test]
    fn test_summary_lines() {
        let cli = Cli::try_parse_from(["newsprint", "-i", "in.png", "-f", "#102030", "-t", "--sampling", "high"])
            .unwrap();
        let separation = Separation::new(cli.options().unwrap()).unwrap();
        assert_eq!(
            summary(&separation),
            vec![
                "Mode: Monochrome".to_string(),
                "      Convert image to monochrome halftone".to_string(),
                "Dot: Circle 8px, adjustment 0%".to_string(),
                "Sampling: High".to_string(),
                "Desaturate: Average".to_string(),
                "Ink: #102030 on transparent, rotation 45°".to_string(),
            ]
        );

        let cli = Cli::try_parse_from(["newsprint", "-i", "in.png", "--mode", "cmyk", "--screen-angles", "eu"])
            .unwrap();
        let separation = Separation::new(cli.options().unwrap()).unwrap();
        let lines = summary(&separation);
        assert!(lines[1].contains("CMYK halftone"));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Screen angles: Standard 4/C European (15/45/0/75)")
        );
        assert!(!lines.iter().any(|line| line.starts_with("Ink:")));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name("Newspaper (CMYK)[K]-photo"), "Newspaper (CMYK)[K]-photo.png");
        assert_eq!(file_name("a/b\\c:d"), "a_b_c_d.png");
        assert_eq!(
            composite_path(Path::new("out"), "g"),
            PathBuf::from("out").join("g.png")
        );
    }
}
