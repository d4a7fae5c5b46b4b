//! Layers - named, ordered evaluation results awaiting compositing.

use serde::Serialize;

use crate::types::{Colour, PixelBuffer};

/// How a layer's pixels combine with the accumulator beneath it.
///
/// Modes operate on the RGB channels; the blended alpha is always the layer
/// pixel's alpha (the compositor's opacity interpolation then covers all
/// four channels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Layer pixel replaces the accumulator pixel.
    #[default]
    Normal,
    /// `a * b / 255` per channel.
    Multiply,
    /// `255 - (255 - a) * (255 - b) / 255` per channel.
    Screen,
    /// Saturating per-channel addition.
    Add,
    /// Saturating per-channel subtraction (layer from accumulator).
    Subtract,
}

impl BlendMode {
    /// All mode names accepted in `mode <name>` clauses.
    pub const NAMES: [&'static str; 5] = ["normal", "multiply", "screen", "add", "subtract"];

    /// Look up a mode by its program-text name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(Self::Normal),
            "multiply" => Some(Self::Multiply),
            "screen" => Some(Self::Screen),
            "add" => Some(Self::Add),
            "subtract" => Some(Self::Subtract),
            _ => None,
        }
    }

    /// The program-text name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Add => "add",
            Self::Subtract => "subtract",
        }
    }

    /// Blend one layer pixel over one accumulator pixel.
    pub fn apply(&self, acc: Colour, top: Colour) -> Colour {
        let channel = |a: u8, b: u8| -> u8 {
            match self {
                Self::Normal => b,
                Self::Multiply => ((a as u16 * b as u16 + 127) / 255) as u8,
                Self::Screen => {
                    let inv = (255 - a as u16) * (255 - b as u16);
                    255 - ((inv + 127) / 255) as u8
                }
                Self::Add => a.saturating_add(b),
                Self::Subtract => a.saturating_sub(b),
            }
        };
        Colour::new(
            channel(acc.r, top.r),
            channel(acc.g, top.g),
            channel(acc.b, top.b),
            top.a,
        )
    }
}

/// One evaluated layer: a named buffer plus its composition metadata.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name (explicit `as` binding or the implicit `layer<n>`).
    pub name: String,

    /// The evaluated pixels.
    pub buffer: PixelBuffer,

    /// Opacity in [0, 1] applied during compositing.
    pub opacity: f64,

    /// Blend mode applied during compositing.
    pub mode: BlendMode,

    /// Z-order index; ascending z composites later (on top).
    pub z: i32,
}

impl Layer {
    /// Create a fully opaque normal layer.
    pub fn new(name: impl Into<String>, buffer: PixelBuffer, z: i32) -> Self {
        Self {
            name: name.into(),
            buffer,
            opacity: 1.0,
            mode: BlendMode::Normal,
            z,
        }
    }
}
