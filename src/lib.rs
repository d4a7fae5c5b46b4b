//! iq - Image expression pipeline
//!
//! A library for transforming raster images with a small expression
//! language: a program derives one or more layers from an input image and
//! composites them into a single output buffer.
//!
//! ```no_run
//! use iq::{process, PixelBuffer, Colour};
//!
//! let image = PixelBuffer::filled(64, 64, Colour::rgb(40, 40, 40));
//! let out = process(&image, "blend(input, invert(input), 0.5)").unwrap();
//! assert_eq!(out.size(), image.size());
//! ```

pub mod cli;
pub mod error;
pub mod eval;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod types;

pub use error::{IqError, Result};
pub use eval::{evaluate, Evaluator};
pub use parser::{
    ast_from_tokens, canonical, parse_program, tokens_from_program, BinaryOp, Expr, Program,
    Statement, Token, TokenKind, UnaryOp,
};
pub use pipeline::{process, process_with_trace, NullTrace, TraceSink};
pub use render::{combine_layers, read_image, write_png, BACKGROUND, DEFAULT_CANVAS_SIZE};
pub use types::{BlendMode, Colour, Layer, PixelBuffer, Value, ValueKind};
