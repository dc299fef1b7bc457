/**
 * Channel Separation Pipeline
 *
 * Runs an output mode's recipe against a layer host:
 *
 * 1. Check preconditions and the recipe itself; nothing is touched when
 *    either fails.
 * 2. Create the output group directly above the source layer.
 * 3. Interpret each channel's operations with an explicit cursor. A channel
 *    whose label is already finished starts from that layer, which is how a
 *    trailing `Remove` gets rid of the transient `KT` helper.
 * 4. Name every surviving cursor after the channel and apply the chosen
 *    action to the source layer.
 *
 * Intermediate layers carry throwaway names (`np-d1`, `np-n2`, ...) until
 * their channel is finished, so name templates never collide with them.
 *
 * A run that fails half way leaves the finished channels in place.
 */

use log::{debug, info};
use thiserror::Error;

use crate::filter::Filter;
use crate::halftone::{HalftoneError, HalftonePass, StyleConfig};
use crate::layer::{LayerError, LayerHost, LayerId, Rect};
use crate::modes::OutputMode;
use crate::naming::{self, DEFAULT_GROUP_TEMPLATE, DEFAULT_LAYER_TEMPLATE};
use crate::progress::Progress;
use crate::recipe::{Channel, Operation, OutputModeDescriptor, RecipeError, SourceRef};

/// Error types for separation runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeparationError {
    /// Invalid input, reported before any layer is created
    #[error("Cannot separate: {0}")]
    Precondition(String),

    /// Invalid recipe or unresolvable channel reference
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Layer host failure
    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),

    /// Halftone failure
    #[error("Halftone error: {0}")]
    Halftone(#[from] HalftoneError),
}

/// Result type for separation runs
pub type Result<T> = std::result::Result<T, SeparationError>;

/// What happens to the source layer after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OriginalLayerAction {
    /// Restore its visibility from before the run
    Unchanged,
    /// Show it
    Visible,
    /// Hide it
    #[default]
    Hidden,
    /// Delete it
    Remove,
}

/// Options of a separation run
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationOptions {
    /// Output mode
    pub mode: OutputMode,
    /// Halftone style
    pub style: StyleConfig,
    /// Template of the output group name
    pub group_name: String,
    /// Template of channel layer names
    pub layer_name: String,
    /// Fate of the source layer
    pub original_layer: OriginalLayerAction,
}

impl Default for SeparationOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::Monochrome,
            style: StyleConfig::default(),
            group_name: DEFAULT_GROUP_TEMPLATE.to_string(),
            layer_name: DEFAULT_LAYER_TEMPLATE.to_string(),
            original_layer: OriginalLayerAction::Hidden,
        }
    }
}

/// A finished channel layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayer {
    /// Channel label
    pub channel: Channel,
    /// Layer id in the host
    pub layer: LayerId,
    /// Layer name
    pub name: String,
}

/// Outcome of a separation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparationResult {
    /// Output group
    pub group: LayerId,
    /// Output group name
    pub group_name: String,
    /// Surviving channel layers, in creation order
    pub channels: Vec<ChannelLayer>,
}

impl SeparationResult {
    /// Layer of a channel, if it survived the run
    pub fn channel(&self, channel: Channel) -> Option<&ChannelLayer> {
        self.channels.iter().find(|layer| layer.channel == channel)
    }
}

/// Separation of a source layer into halftone channel layers
#[derive(Debug, Clone)]
pub struct Separation {
    options: SeparationOptions,
}

impl Separation {
    /// Create a separation, validating the style
    pub fn new(options: SeparationOptions) -> Result<Self> {
        options
            .style
            .validate()
            .map_err(|err| SeparationError::Precondition(err.to_string()))?;
        Ok(Self { options })
    }

    /// Options of the run
    pub fn options(&self) -> &SeparationOptions {
        &self.options
    }

    /// Recipe selected by the options
    pub fn descriptor(&self) -> &'static OutputModeDescriptor {
        self.options.mode.descriptor(self.options.style.mono_desaturate)
    }

    /// Run the selected mode on `source`
    pub fn process<H: LayerHost + ?Sized>(
        &self,
        host: &mut H,
        source: LayerId,
        progress: &mut dyn Progress,
    ) -> Result<SeparationResult> {
        self.process_with_descriptor(host, source, self.descriptor(), progress)
    }

    /// Run an explicit recipe on `source`
    pub fn process_with_descriptor<H: LayerHost + ?Sized>(
        &self,
        host: &mut H,
        source: LayerId,
        descriptor: &OutputModeDescriptor,
        progress: &mut dyn Progress,
    ) -> Result<SeparationResult> {
        check_preconditions(host, source)?;
        descriptor.validate()?;

        progress.set_length(descriptor.step_count() as u64);
        progress.message(descriptor.label);

        let source_name = host.layer_name(source)?;
        let was_visible = host.is_visible(source)?;
        if !was_visible {
            host.set_visible(source, true)?;
        }

        let group_name = naming::group_name(&self.options.group_name, descriptor.group_name, &source_name);
        let group = host.create_group(&group_name, source)?;
        info!("Separating '{}' into '{}' ({})", source_name, group_name, descriptor.label);
        progress.step();

        let mut run = Run {
            host: &mut *host,
            style: &self.options.style,
            source,
            group,
            finished: Vec::new(),
            created: 0,
        };

        for spec in descriptor.channels {
            let name = naming::channel_name(
                &self.options.layer_name,
                descriptor.group_name,
                &source_name,
                spec.channel,
            );
            progress.message(&name);

            let mut cursor = run.finished_layer(spec.channel);
            for operation in spec.operations {
                cursor = run.execute(spec.channel, operation, cursor, progress)?;
                progress.step();
            }
            run.finish(spec.channel, cursor, name)?;
        }

        let channels = run.finished;
        progress.step();

        match self.options.original_layer {
            OriginalLayerAction::Unchanged => host.set_visible(source, was_visible)?,
            OriginalLayerAction::Visible => host.set_visible(source, true)?,
            OriginalLayerAction::Hidden => host.set_visible(source, false)?,
            OriginalLayerAction::Remove => host.remove(source)?,
        }
        progress.step();

        info!(
            "Separated '{}': {} channel layer(s)",
            source_name,
            channels.len()
        );
        progress.step();
        progress.finish();

        Ok(SeparationResult {
            group,
            group_name,
            channels,
        })
    }
}

/// Run `options.mode` on `source`
pub fn process<H: LayerHost + ?Sized>(
    host: &mut H,
    source: LayerId,
    options: SeparationOptions,
    progress: &mut dyn Progress,
) -> Result<SeparationResult> {
    Separation::new(options)?.process(host, source, progress)
}

fn check_preconditions<H: LayerHost + ?Sized>(host: &H, source: LayerId) -> Result<()> {
    let (width, height) = host.canvas_size();
    if width == 0 || height == 0 {
        return Err(SeparationError::Precondition(format!(
            "canvas is empty ({}x{})",
            width, height
        )));
    }

    match host.is_group(source) {
        Err(LayerError::UnknownLayer(_)) => Err(SeparationError::Precondition(format!(
            "source layer {} does not exist",
            source
        ))),
        Err(err) => Err(err.into()),
        Ok(true) => Err(SeparationError::Precondition(format!(
            "source layer {} is a group",
            source
        ))),
        Ok(false) => match host.parent(source)? {
            Some(_) => Ok(()),
            None => Err(SeparationError::Precondition(
                "source layer has no parent group".to_string(),
            )),
        },
    }
}

/// State of one run: the host, the output group and the finished channels
struct Run<'a, H: LayerHost + ?Sized> {
    host: &'a mut H,
    style: &'a StyleConfig,
    source: LayerId,
    group: LayerId,
    finished: Vec<ChannelLayer>,
    created: usize,
}

impl<H: LayerHost + ?Sized> Run<'_, H> {
    fn finished_layer(&self, channel: Channel) -> Option<LayerId> {
        self.finished
            .iter()
            .find(|layer| layer.channel == channel)
            .map(|layer| layer.layer)
    }

    fn canvas(&self) -> Rect {
        let (width, height) = self.host.canvas_size();
        Rect::from_size(width, height)
    }

    fn placeholder_name(&mut self, prefix: char) -> String {
        self.created += 1;
        format!("np-{}{}", prefix, self.created)
    }

    /// Apply one operation, returns the new cursor
    fn execute(
        &mut self,
        channel: Channel,
        operation: &Operation,
        cursor: Option<LayerId>,
        progress: &mut dyn Progress,
    ) -> Result<Option<LayerId>> {
        debug!("[{}] {}", channel, operation.name());

        let current = || {
            cursor.ok_or(RecipeError::EmptyCursor {
                channel,
                operation: operation.name(),
            })
        };

        match *operation {
            Operation::Duplicate(reference) => {
                let from = match reference {
                    SourceRef::Original => self.source,
                    SourceRef::Channel(other) => self
                        .finished_layer(other)
                        .ok_or(RecipeError::UnresolvedChannel(other))?,
                };
                let copy = self.host.duplicate(from, self.group, cursor)?;
                let name = self.placeholder_name('d');
                self.host.set_layer_name(copy, &name)?;
                Ok(Some(copy))
            }
            Operation::NewFillLayer(color) => {
                let fill = self.host.create_fill(color, self.group, cursor)?;
                let name = self.placeholder_name('n');
                self.host.set_layer_name(fill, &name)?;
                Ok(Some(fill))
            }
            Operation::Remove => {
                self.host.remove(current()?)?;
                Ok(None)
            }
            Operation::MergeDown => {
                let merged = self.host.merge_down(current()?)?;
                let canvas = self.canvas();
                self.host.crop(merged, canvas)?;
                Ok(Some(merged))
            }
            Operation::SetBlendMode(mode) => {
                self.host.set_blend_mode(current()?, mode)?;
                Ok(cursor)
            }
            Operation::SetOpacity(opacity) => {
                self.host.set_opacity(current()?, opacity)?;
                Ok(cursor)
            }
            Operation::ApplyDesaturate(method) => {
                let canvas = self.canvas();
                self.host
                    .apply_filter(current()?, &Filter::Desaturate(method), canvas)?;
                Ok(cursor)
            }
            Operation::ApplyHalftone => {
                let layer = current()?;
                HalftonePass::new(self.style, channel)?.apply(&mut *self.host, layer, progress)?;
                Ok(cursor)
            }
        }
    }

    /// Record the surviving cursor of a channel under its final name
    fn finish(&mut self, channel: Channel, cursor: Option<LayerId>, name: String) -> Result<()> {
        match cursor {
            Some(layer) => {
                self.host.set_layer_name(layer, &name)?;
                debug!("[{}] finished as '{}'", channel, name);
                let finished = ChannelLayer {
                    channel,
                    layer,
                    name,
                };
                match self.finished.iter_mut().find(|entry| entry.channel == channel) {
                    Some(entry) => *entry = finished,
                    None => self.finished.push(finished),
                }
            }
            None => {
                debug!("[{}] removed", channel);
                self.finished.retain(|entry| entry.channel != channel);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::document::Document;
    use crate::filter::DesaturateMethod;
    use crate::progress::NoProgress;
    use crate::recipe::ChannelSpec;
    use crate::render::Antialiasing;
    use image::{Rgba, RgbaImage};

    #[derive(Default)]
    struct CountingProgress {
        length: u64,
        steps: u64,
        finished: bool,
    }

    impl Progress for CountingProgress {
        fn set_length(&mut self, steps: u64) {
            self.length = steps;
        }

        fn step(&mut self) {
            self.steps += 1;
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    fn options(mode: OutputMode) -> SeparationOptions {
        SeparationOptions {
            mode,
            style: StyleConfig {
                seed: Some(7),
                ..StyleConfig::default()
            },
            ..SeparationOptions::default()
        }
    }

    #[test]
    fn test_monochrome_names_and_placement() {
        let (mut document, source) = Document::from_image("Background", solid(24, 24, [128, 128, 128, 255]));

        let result = process(&mut document, source, options(OutputMode::Monochrome), &mut NoProgress).unwrap();

        assert_eq!(result.group_name, "Newspaper (Monochrome)-Background");
        assert_eq!(document.layer_name(result.group).unwrap(), result.group_name);
        assert_eq!(document.children(document.root()).unwrap(), vec![source, result.group]);

        assert_eq!(result.channels.len(), 1);
        let mono = &result.channels[0];
        assert_eq!(mono.channel, Channel::Mono);
        assert_eq!(mono.name, "Newspaper (Monochrome)[Mono]-Background");
        assert_eq!(document.children(result.group).unwrap(), vec![mono.layer]);

        // Hidden by default
        assert!(!document.is_visible(source).unwrap());

        // Screened: both ink and paper are present
        let image = document.layer_image(mono.layer).unwrap();
        assert!(image.pixels().any(|p| p[0] < 64));
        assert!(image.pixels().any(|p| p[0] == 255));
    }

    #[test]
    fn test_cmyk_on_pure_red() {
        let (mut document, source) = Document::from_image("red", solid(32, 32, [255, 0, 0, 255]));
        let mut progress = CountingProgress::default();

        let result = process(&mut document, source, options(OutputMode::Cmyk), &mut progress).unwrap();

        let channels: Vec<Channel> = result.channels.iter().map(|c| c.channel).collect();
        assert_eq!(
            channels,
            vec![Channel::Black, Channel::Yellow, Channel::Magenta, Channel::Cyan]
        );

        let image = |channel: Channel| {
            let layer = result.channel(channel).unwrap().layer;
            document.layer_image(layer).unwrap()
        };

        // No black and no cyan in red
        assert!(image(Channel::Black).pixels().all(|p| p == &Rgba([255, 255, 255, 255])));
        assert!(image(Channel::Cyan).pixels().all(|p| p == &Rgba([255, 255, 255, 255])));

        // Full yellow and magenta
        assert!(image(Channel::Yellow).pixels().any(|p| p == &Rgba([255, 255, 0, 255])));
        assert!(image(Channel::Magenta).pixels().any(|p| p == &Rgba([255, 0, 255, 255])));

        // Color plates multiply, the black plate does not
        let yellow = result.channel(Channel::Yellow).unwrap().layer;
        let black = result.channel(Channel::Black).unwrap().layer;
        assert_eq!(document.blend_mode(yellow).unwrap(), crate::layer::BlendMode::Multiply);
        assert_eq!(document.blend_mode(black).unwrap(), crate::layer::BlendMode::Normal);

        // Merged plates cover the canvas
        assert_eq!(document.bounds(yellow).unwrap(), Rect::from_size(32, 32));

        let expected = OutputMode::Cmyk.descriptor(DesaturateMethod::Average).step_count() as u64;
        assert_eq!(progress.length, expected);
        assert_eq!(progress.steps, expected);
        assert!(progress.finished);
    }

    #[test]
    fn test_comics_helper_is_removed() {
        for mode in [OutputMode::CmyKComics1, OutputMode::CmyKComics2] {
            let (mut document, source) = Document::from_image("gray", solid(16, 16, [128, 128, 128, 255]));

            let result = process(&mut document, source, options(mode), &mut NoProgress).unwrap();

            assert!(result.channel(Channel::BlackTemp).is_none());
            let children = document.children(result.group).unwrap();
            assert_eq!(children.len(), 4);
            for child in children {
                let name = document.layer_name(child).unwrap();
                assert!(!name.contains("[KT]"), "{}", name);
                assert!(!name.starts_with("np-"), "{}", name);
            }
            let names: Vec<&str> = result.channels.iter().map(|c| c.channel.short()).collect();
            assert_eq!(names, vec!["K", "Y", "M", "C"]);
        }
    }

    #[test]
    fn test_channel_layers_stack_in_creation_order() {
        let (mut document, source) = Document::from_image("img", solid(12, 12, [40, 90, 200, 255]));
        let result = process(&mut document, source, options(OutputMode::Cmy), &mut NoProgress).unwrap();

        let layers: Vec<LayerId> = result.channels.iter().map(|c| c.layer).collect();
        assert_eq!(document.children(result.group).unwrap(), layers);
    }

    #[test]
    fn test_seeded_monochrome_is_reproducible() {
        let source = solid(40, 30, [90, 90, 90, 255]);
        let make = || {
            let (mut document, layer) = Document::from_image("src", source.clone());
            let mut opts = options(OutputMode::Monochrome);
            opts.style.steadiness = 4;
            let result = process(&mut document, layer, opts, &mut NoProgress).unwrap();
            document.layer_image(result.channels[0].layer).unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_original_layer_actions() {
        let run = |action: OriginalLayerAction, visible_before: bool| {
            let (mut document, source) = Document::from_image("src", solid(8, 8, [0, 0, 0, 255]));
            document.set_visible(source, visible_before).unwrap();
            let opts = SeparationOptions {
                original_layer: action,
                ..options(OutputMode::Monochrome)
            };
            let result = process(&mut document, source, opts, &mut NoProgress).unwrap();
            (document, source, result)
        };

        let (document, source, _) = run(OriginalLayerAction::Unchanged, false);
        assert!(!document.is_visible(source).unwrap());
        let (document, source, _) = run(OriginalLayerAction::Visible, false);
        assert!(document.is_visible(source).unwrap());
        let (document, source, _) = run(OriginalLayerAction::Hidden, true);
        assert!(!document.is_visible(source).unwrap());

        let (document, source, result) = run(OriginalLayerAction::Remove, true);
        assert!(document.layer_name(source).is_err());
        assert_eq!(document.children(document.root()).unwrap(), vec![result.group]);
    }

    #[test]
    fn test_custom_templates() {
        let (mut document, source) = Document::from_image("photo", solid(8, 8, [0, 0, 0, 255]));
        let opts = SeparationOptions {
            group_name: "{source:name} ({mode})".to_string(),
            layer_name: "{color:long}".to_string(),
            ..options(OutputMode::CmyRichK)
        };
        let result = process(&mut document, source, opts, &mut NoProgress).unwrap();

        assert_eq!(result.group_name, "photo (Newspaper (CMY+rK))");
        let names: Vec<&str> = result.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Black", "Yellow", "Magenta", "Cyan"]);
    }

    #[test]
    fn test_preconditions_leave_host_untouched() {
        // Empty canvas
        let (mut empty, layer) = Document::from_image("empty", RgbaImage::new(0, 0));
        let err = process(&mut empty, layer, SeparationOptions::default(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, SeparationError::Precondition(_)));
        assert_eq!(empty.children(empty.root()).unwrap(), vec![layer]);

        // Unknown layer
        let (mut document, source) = Document::from_image("src", solid(4, 4, [0, 0, 0, 255]));
        let missing = LayerId::new(999);
        let err = process(&mut document, missing, SeparationOptions::default(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, SeparationError::Precondition(_)));

        // Group as source
        let group = document.create_group("group", source).unwrap();
        let err = process(&mut document, group, SeparationOptions::default(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, SeparationError::Precondition(_)));

        // Invalid style
        let opts = SeparationOptions {
            style: StyleConfig {
                dot_size: 0.0,
                ..StyleConfig::default()
            },
            ..SeparationOptions::default()
        };
        assert!(matches!(Separation::new(opts), Err(SeparationError::Precondition(_))));

        assert_eq!(document.children(document.root()).unwrap(), vec![source, group]);
        assert!(document.children(group).unwrap().is_empty());
    }

    #[test]
    fn test_forward_reference_is_rejected_before_any_change() {
        static BROKEN: OutputModeDescriptor = OutputModeDescriptor {
            label: "broken",
            description: "references black before it exists",
            group_name: "Broken",
            channels: &[
                ChannelSpec {
                    channel: Channel::Yellow,
                    operations: &[
                        Operation::Duplicate(SourceRef::Original),
                        Operation::Duplicate(SourceRef::Channel(Channel::Black)),
                    ],
                },
                ChannelSpec {
                    channel: Channel::Black,
                    operations: &[Operation::Duplicate(SourceRef::Original)],
                },
            ],
        };

        let (mut document, source) = Document::from_image("src", solid(4, 4, [0, 0, 0, 255]));
        let separation = Separation::new(SeparationOptions::default()).unwrap();
        let err = separation
            .process_with_descriptor(&mut document, source, &BROKEN, &mut NoProgress)
            .unwrap_err();

        assert_eq!(
            err,
            SeparationError::Recipe(RecipeError::ForwardReference {
                channel: Channel::Yellow,
                reference: Channel::Black,
            })
        );
        assert_eq!(document.children(document.root()).unwrap(), vec![source]);
        assert!(document.is_visible(source).unwrap());
    }

    #[test]
    fn test_fill_and_opacity_recipe() {
        static TINT: OutputModeDescriptor = OutputModeDescriptor {
            label: "tint",
            description: "half opaque fill merged onto the source",
            group_name: "Tint",
            channels: &[ChannelSpec {
                channel: Channel::Mono,
                operations: &[
                    Operation::Duplicate(SourceRef::Original),
                    Operation::NewFillLayer(Color::WHITE),
                    Operation::SetOpacity(128),
                    Operation::MergeDown,
                ],
            }],
        };

        let (mut document, source) = Document::from_image("src", solid(4, 4, [0, 0, 0, 255]));
        let separation = Separation::new(SeparationOptions {
            style: StyleConfig {
                antialiasing: Antialiasing::None,
                ..StyleConfig::default()
            },
            ..SeparationOptions::default()
        })
        .unwrap();
        let result = separation
            .process_with_descriptor(&mut document, source, &TINT, &mut NoProgress)
            .unwrap();

        let layer = result.channel(Channel::Mono).unwrap().layer;
        assert_eq!(document.layer_name(layer).unwrap(), "Tint[Mono]-src");
        assert_eq!(
            document.layer_image(layer).unwrap().get_pixel(0, 0),
            &Rgba([128, 128, 128, 255])
        );
    }
}
