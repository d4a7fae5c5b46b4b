//! Core data types for the iq pipeline.

mod buffer;
mod colour;
mod layer;
mod value;

pub use buffer::PixelBuffer;
pub use colour::Colour;
pub use layer::{BlendMode, Layer};
pub use value::{Value, ValueKind};
