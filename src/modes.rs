/**
 * Output Mode Registry
 *
 * The static recipe tables of every supported separation:
 *
 * - Monochrome: one channel, desaturated with a selectable method.
 * - CMY: cyan, magenta and yellow only; black is their combination.
 * - CMYK: a black plate drawn first, removed from the color plates by
 *   division so colors do not print under black.
 * - CMY+rK: black plate printed over full CMY ("rich black").
 * - CMY+K comics #1 and #2: a flat, non-screened black plate for line art,
 *   with the color plates built around a transient `KT` helper.
 *
 * A color plate is extracted by adding the ink color to a copy of the
 * source and keeping the minimum component: wherever the source already
 * reflects what the ink absorbs, the plate goes white.
 */

use crate::color::Color;
use crate::filter::DesaturateMethod;
use crate::layer::BlendMode;
use crate::recipe::Operation::{
    ApplyDesaturate, ApplyHalftone, Duplicate, MergeDown, NewFillLayer, Remove, SetBlendMode, SetOpacity,
};
use crate::recipe::{Channel, ChannelSpec, OutputModeDescriptor, SourceRef};

/// Separation modes offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputMode {
    /// Single ink halftone
    #[default]
    Monochrome,
    /// Three color separation
    Cmy,
    /// Four color separation for pictures
    Cmyk,
    /// Four color separation with rich black
    CmyRichK,
    /// Four color separation for comics, method #1
    CmyKComics1,
    /// Four color separation for comics, method #2
    CmyKComics2,
}

impl OutputMode {
    /// All modes, in menu order
    pub const ALL: [OutputMode; 6] = [
        OutputMode::Monochrome,
        OutputMode::Cmy,
        OutputMode::Cmyk,
        OutputMode::CmyRichK,
        OutputMode::CmyKComics1,
        OutputMode::CmyKComics2,
    ];

    /// Recipe of the mode; monochrome is specialised by desaturation method
    pub fn descriptor(self, mono_method: DesaturateMethod) -> &'static OutputModeDescriptor {
        match self {
            OutputMode::Monochrome => monochrome(mono_method),
            OutputMode::Cmy => &CMY,
            OutputMode::Cmyk => &CMYK,
            OutputMode::CmyRichK => &CMY_RICH_K,
            OutputMode::CmyKComics1 => &CMY_K_COMICS_1,
            OutputMode::CmyKComics2 => &CMY_K_COMICS_2,
        }
    }

    /// True for the ink separation modes
    pub fn is_color(self) -> bool {
        self != OutputMode::Monochrome
    }
}

/// Screen angle scheme for the four process inks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenAngles {
    /// Standard 4/C U.S. (15/75/0/45)
    #[default]
    Us,
    /// Standard 4/C European (15/45/0/75)
    European,
}

impl ScreenAngles {
    /// Screen angle of an ink channel, in degrees
    pub fn angle(self, channel: Channel) -> Option<f64> {
        let (cyan, magenta, yellow, black) = match self {
            ScreenAngles::Us => (15.0, 75.0, 0.0, 45.0),
            ScreenAngles::European => (15.0, 45.0, 0.0, 75.0),
        };
        match channel {
            Channel::Cyan => Some(cyan),
            Channel::Magenta => Some(magenta),
            Channel::Yellow => Some(yellow),
            Channel::Black => Some(black),
            Channel::Mono | Channel::BlackTemp => None,
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            ScreenAngles::Us => "Standard 4/C U.S. (15/75/0/45)",
            ScreenAngles::European => "Standard 4/C European (15/45/0/75)",
        }
    }
}

/// Every descriptor in the registry
pub fn all_descriptors() -> impl Iterator<Item = &'static OutputModeDescriptor> {
    MONOCHROME.iter().chain([
        &CMY,
        &CMYK,
        &CMY_RICH_K,
        &CMY_K_COMICS_1,
        &CMY_K_COMICS_2,
    ])
}

fn monochrome(method: DesaturateMethod) -> &'static OutputModeDescriptor {
    match method {
        DesaturateMethod::Lightness => &MONOCHROME[0],
        DesaturateMethod::Luminosity709 => &MONOCHROME[1],
        DesaturateMethod::Luminosity601 => &MONOCHROME[2],
        DesaturateMethod::Average => &MONOCHROME[3],
        DesaturateMethod::Minimum => &MONOCHROME[4],
        DesaturateMethod::Maximum => &MONOCHROME[5],
    }
}

macro_rules! mono {
    ($method:expr) => {
        OutputModeDescriptor {
            label: "Monochrome",
            description: "Convert image to monochrome halftone",
            group_name: "Newspaper (Monochrome)",
            channels: &[ChannelSpec {
                channel: Channel::Mono,
                operations: &[
                    Duplicate(SourceRef::Original),
                    ApplyDesaturate($method),
                    ApplyHalftone,
                ],
            }],
        }
    };
}

// Color plate: source + ink, kept as the minimum component
macro_rules! plate {
    ($channel:expr, $ink:expr) => {
        ChannelSpec {
            channel: $channel,
            operations: &[
                Duplicate(SourceRef::Original),
                NewFillLayer($ink),
                SetBlendMode(BlendMode::Add),
                MergeDown,
                SetBlendMode(BlendMode::Multiply),
                ApplyDesaturate(DesaturateMethod::Minimum),
                ApplyHalftone,
            ],
        }
    };
    // Same, with the black plate divided out
    ($channel:expr, $ink:expr, without $black:expr) => {
        ChannelSpec {
            channel: $channel,
            operations: &[
                Duplicate(SourceRef::Original),
                NewFillLayer($ink),
                SetBlendMode(BlendMode::Add),
                MergeDown,
                Duplicate(SourceRef::Channel($black)),
                SetBlendMode(BlendMode::Divide),
                MergeDown,
                SetBlendMode(BlendMode::Multiply),
                ApplyDesaturate(DesaturateMethod::Minimum),
                ApplyHalftone,
            ],
        }
    };
    // Black divided out, then half of its converse folded back
    ($channel:expr, $ink:expr, without $black:expr, converse) => {
        ChannelSpec {
            channel: $channel,
            operations: &[
                Duplicate(SourceRef::Original),
                NewFillLayer($ink),
                SetBlendMode(BlendMode::Add),
                MergeDown,
                Duplicate(SourceRef::Channel($black)),
                SetBlendMode(BlendMode::Divide),
                MergeDown,
                Duplicate(SourceRef::Channel($black)),
                SetBlendMode(BlendMode::Converse),
                SetOpacity(128),
                MergeDown,
                SetBlendMode(BlendMode::Multiply),
                ApplyDesaturate(DesaturateMethod::Minimum),
                ApplyHalftone,
            ],
        }
    };
}

const BLACK_PLATE: ChannelSpec = ChannelSpec {
    channel: Channel::Black,
    operations: &[
        Duplicate(SourceRef::Original),
        ApplyDesaturate(DesaturateMethod::Maximum),
        ApplyHalftone,
    ],
};

const COMICS_BLACK: ChannelSpec = ChannelSpec {
    channel: Channel::Black,
    operations: &[Duplicate(SourceRef::Channel(Channel::BlackTemp))],
};

const REMOVE_HELPER: ChannelSpec = ChannelSpec {
    channel: Channel::BlackTemp,
    operations: &[Remove],
};

static MONOCHROME: [OutputModeDescriptor; 6] = [
    mono!(DesaturateMethod::Lightness),
    mono!(DesaturateMethod::Luminosity709),
    mono!(DesaturateMethod::Luminosity601),
    mono!(DesaturateMethod::Average),
    mono!(DesaturateMethod::Minimum),
    mono!(DesaturateMethod::Maximum),
];

static CMY: OutputModeDescriptor = OutputModeDescriptor {
    label: "Three color (CMY - Pictures)",
    description: "Decompose the image into the 3 primary colors (CMY) and apply halftone; \
                  black is obtained as a combination of cyan, magenta and yellow",
    group_name: "Newspaper (CMY)",
    channels: &[
        plate!(Channel::Yellow, Color::YELLOW),
        plate!(Channel::Magenta, Color::MAGENTA),
        plate!(Channel::Cyan, Color::CYAN),
    ],
};

static CMYK: OutputModeDescriptor = OutputModeDescriptor {
    label: "Four color (CMYK - Pictures)",
    description: "Decompose the image into a four color CMYK halftone, as used in color printing",
    group_name: "Newspaper (CMYK)",
    channels: &[
        BLACK_PLATE,
        plate!(Channel::Yellow, Color::YELLOW, without Channel::Black),
        plate!(Channel::Magenta, Color::MAGENTA, without Channel::Black),
        plate!(Channel::Cyan, Color::CYAN, without Channel::Black),
    ],
};

static CMY_RICH_K: OutputModeDescriptor = OutputModeDescriptor {
    label: "Four color (CMY+K - Pictures)",
    description: "Decompose the image into 4 colors (CMYK) and apply halftone; \
                  registration black is cyan, magenta and yellow with additional black",
    group_name: "Newspaper (CMY+rK)",
    channels: &[
        BLACK_PLATE,
        plate!(Channel::Yellow, Color::YELLOW),
        plate!(Channel::Magenta, Color::MAGENTA),
        plate!(Channel::Cyan, Color::CYAN),
    ],
};

static CMY_K_COMICS_1: OutputModeDescriptor = OutputModeDescriptor {
    label: "Four color (CMY+K - Comics #1)",
    description: "Decompose the image into a four color CMYK halftone, for comics style pictures (method #1)",
    group_name: "Newspaper (CMY+K #1)",
    channels: &[
        ChannelSpec {
            channel: Channel::BlackTemp,
            operations: &[
                Duplicate(SourceRef::Original),
                ApplyDesaturate(DesaturateMethod::Maximum),
            ],
        },
        COMICS_BLACK,
        plate!(Channel::Yellow, Color::YELLOW, without Channel::BlackTemp),
        plate!(Channel::Magenta, Color::MAGENTA, without Channel::BlackTemp),
        plate!(Channel::Cyan, Color::CYAN, without Channel::BlackTemp),
        REMOVE_HELPER,
    ],
};

static CMY_K_COMICS_2: OutputModeDescriptor = OutputModeDescriptor {
    label: "Four color (CMY+K - Comics #2)",
    description: "Decompose the image into a four color CMYK halftone, for comics style pictures (method #2)",
    group_name: "Newspaper (CMY+K #2)",
    channels: &[
        ChannelSpec {
            channel: Channel::BlackTemp,
            operations: &[
                Duplicate(SourceRef::Original),
                ApplyDesaturate(DesaturateMethod::Maximum),
                Duplicate(SourceRef::Original),
                ApplyDesaturate(DesaturateMethod::Maximum),
                SetBlendMode(BlendMode::Add),
                MergeDown,
            ],
        },
        COMICS_BLACK,
        plate!(Channel::Yellow, Color::YELLOW, without Channel::BlackTemp, converse),
        plate!(Channel::Magenta, Color::MAGENTA, without Channel::BlackTemp, converse),
        plate!(Channel::Cyan, Color::CYAN, without Channel::BlackTemp, converse),
        REMOVE_HELPER,
    ],
};
