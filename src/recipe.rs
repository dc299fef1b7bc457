/**
 * Separation Recipes
 *
 * An output mode is described declaratively: an ordered list of channels,
 * each carrying the operations that build its layer. The pipeline
 * interprets these tables against a layer host.
 *
 * Every channel works on a single "cursor" layer. Operations either create
 * a new layer that becomes the cursor (duplicate, fill), replace it (merge
 * down), clear it (remove) or modify it in place. When a channel's
 * operations are done, the surviving cursor is the channel's finished layer
 * and can be referenced by later channels.
 */

use std::fmt;

use thiserror::Error;

use crate::color::Color;
use crate::filter::DesaturateMethod;
use crate::layer::BlendMode;

/// Progress steps a halftone operation accounts for
pub const HALFTONE_STEPS: usize = 20;

/// Progress steps outside the channel operations
pub const FIXED_STEPS: usize = 4;

/// Color separation channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Single ink, user colors
    Mono,
    /// Cyan ink
    Cyan,
    /// Magenta ink
    Magenta,
    /// Yellow ink
    Yellow,
    /// Black ink
    Black,
    /// Transient black helper, removed at the end of a run
    BlackTemp,
}

impl Channel {
    /// Short label used in layer names
    pub fn short(self) -> &'static str {
        match self {
            Channel::Mono => "Mono",
            Channel::Cyan => "C",
            Channel::Magenta => "M",
            Channel::Yellow => "Y",
            Channel::Black => "K",
            Channel::BlackTemp => "KT",
        }
    }

    /// Ink name, empty for channels that are not process inks
    pub fn long(self) -> &'static str {
        match self {
            Channel::Cyan => "Cyan",
            Channel::Magenta => "Magenta",
            Channel::Yellow => "Yellow",
            Channel::Black => "Black",
            Channel::Mono | Channel::BlackTemp => "",
        }
    }

    /// Process ink color, `None` for non-ink channels
    pub fn ink(self) -> Option<Color> {
        match self {
            Channel::Cyan => Some(Color::CYAN),
            Channel::Magenta => Some(Color::MAGENTA),
            Channel::Yellow => Some(Color::YELLOW),
            Channel::Black => Some(Color::BLACK),
            Channel::Mono | Channel::BlackTemp => None,
        }
    }

    /// True for channels that can be halftoned
    pub fn is_screened(self) -> bool {
        self == Channel::Mono || self.ink().is_some()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// Layer a duplicate is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRef {
    /// The untouched source layer
    Original,
    /// A channel finished earlier in the same run
    Channel(Channel),
}

/// One step of a channel recipe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Copy a layer above the cursor; the copy becomes the cursor
    Duplicate(SourceRef),
    /// Canvas-size uniform layer above the cursor; it becomes the cursor
    NewFillLayer(Color),
    /// Delete the cursor layer
    Remove,
    /// Composite the cursor onto the layer beneath it
    MergeDown,
    /// Set the cursor's blend mode
    SetBlendMode(BlendMode),
    /// Set the cursor's opacity
    SetOpacity(u8),
    /// Desaturate the cursor
    ApplyDesaturate(DesaturateMethod),
    /// Render the cursor as a halftone screen
    ApplyHalftone,
}

impl Operation {
    /// Short name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Duplicate(_) => "duplicate",
            Operation::NewFillLayer(_) => "new fill layer",
            Operation::Remove => "remove",
            Operation::MergeDown => "merge down",
            Operation::SetBlendMode(_) => "blending mode",
            Operation::SetOpacity(_) => "opacity",
            Operation::ApplyDesaturate(_) => "desaturate",
            Operation::ApplyHalftone => "halftone",
        }
    }

    /// Progress steps this operation accounts for
    pub fn steps(&self) -> usize {
        match self {
            Operation::ApplyHalftone => 1 + HALFTONE_STEPS,
            _ => 1,
        }
    }

    /// True when the operation needs an existing cursor layer
    fn needs_cursor(&self) -> bool {
        !matches!(self, Operation::Duplicate(_) | Operation::NewFillLayer(_))
    }
}

/// Recipe of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSpec {
    /// Channel built by the operations
    pub channel: Channel,
    /// Operations, in execution order
    pub operations: &'static [Operation],
}

/// Static description of an output mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputModeDescriptor {
    /// Human readable mode name
    pub label: &'static str,
    /// One sentence description
    pub description: &'static str,
    /// Base name of the output group, substituted for `{mode}`
    pub group_name: &'static str,
    /// Channel recipes, in execution order
    pub channels: &'static [ChannelSpec],
}

impl OutputModeDescriptor {
    /**
     * Check the recipe without touching any layer
     *
     * Simulates which channels are finished after each step: a duplicate may
     * only reference a channel finished earlier, operations working on the
     * cursor need one, and only screened channels may be halftoned.
     */
    pub fn validate(&self) -> Result<()> {
        let mut finished: Vec<Channel> = Vec::new();

        for spec in self.channels {
            let mut has_cursor = finished.contains(&spec.channel);

            for operation in spec.operations {
                match operation {
                    Operation::Duplicate(SourceRef::Channel(reference)) => {
                        if !finished.contains(reference) {
                            return Err(RecipeError::ForwardReference {
                                channel: spec.channel,
                                reference: *reference,
                            });
                        }
                        has_cursor = true;
                    }
                    Operation::Duplicate(SourceRef::Original) | Operation::NewFillLayer(_) => {
                        has_cursor = true;
                    }
                    Operation::Remove => {
                        if !has_cursor {
                            return Err(RecipeError::RemoveWithoutLayer(spec.channel));
                        }
                        has_cursor = false;
                    }
                    Operation::ApplyHalftone if !spec.channel.is_screened() => {
                        return Err(RecipeError::UnscreenedChannel(spec.channel));
                    }
                    other => {
                        if other.needs_cursor() && !has_cursor {
                            return Err(RecipeError::EmptyCursor {
                                channel: spec.channel,
                                operation: other.name(),
                            });
                        }
                    }
                }
            }

            if has_cursor {
                if !finished.contains(&spec.channel) {
                    finished.push(spec.channel);
                }
            } else {
                finished.retain(|channel| *channel != spec.channel);
            }
        }

        Ok(())
    }

    /// Total progress steps of a run
    pub fn step_count(&self) -> usize {
        FIXED_STEPS
            + self
                .channels
                .iter()
                .flat_map(|spec| spec.operations.iter())
                .map(Operation::steps)
                .sum::<usize>()
    }

    /// Channels whose layer survives a run, in creation order
    pub fn output_channels(&self) -> Vec<Channel> {
        let mut finished: Vec<Channel> = Vec::new();
        for spec in self.channels {
            let removed = spec.operations.last() == Some(&Operation::Remove);
            if removed {
                finished.retain(|channel| *channel != spec.channel);
            } else if !finished.contains(&spec.channel) {
                finished.push(spec.channel);
            }
        }
        finished
    }
}

/// Error types for recipe validation and interpretation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    /// A duplicate references a channel that is not finished yet
    #[error("Channel {channel} duplicates channel {reference} before it is finished")]
    ForwardReference {
        /// Channel being built
        channel: Channel,
        /// Channel referenced
        reference: Channel,
    },

    /// A remove with no layer to remove
    #[error("Channel {0} removes a layer it does not have")]
    RemoveWithoutLayer(Channel),

    /// An operation that needs a cursor layer runs without one
    #[error("Channel {channel}: '{operation}' has no layer to work on")]
    EmptyCursor {
        /// Channel being built
        channel: Channel,
        /// Offending operation
        operation: &'static str,
    },

    /// A halftone on a channel that has no screen
    #[error("Channel {0} has no halftone screen")]
    UnscreenedChannel(Channel),

    /// The layer of a referenced channel cannot be found at run time
    #[error("Channel {0} is not available")]
    UnresolvedChannel(Channel),
}

/// Result type for recipe operations
pub type Result<T> = std::result::Result<T, RecipeError>;
