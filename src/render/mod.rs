//! Compositing and image file output.

mod compose;
mod png;

pub use compose::{combine_layers, BACKGROUND, DEFAULT_CANVAS_SIZE};
pub use png::{read_image, write_png};
