//! Image decoding and encoding for the CLI collaborators.
//!
//! The pipeline itself only sees in-memory buffers; these helpers convert
//! between files and `PixelBuffer` using the `image` crate. Reading accepts
//! any format the crate decodes; writing picks the format from the output
//! path's extension (PNG by default in the CLI).

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::error::{IqError, Result};
use crate::types::{Colour, PixelBuffer};

/// Decode an image file into an RGBA pixel buffer.
pub fn read_image(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path)
        .map_err(|e| IqError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read image: {}", e),
        })?
        .to_rgba8();

    Ok(PixelBuffer::from_fn(
        img.width() as usize,
        img.height() as usize,
        |x, y| {
            let p = img.get_pixel(x as u32, y as u32);
            Colour::new(p[0], p[1], p[2], p[3])
        },
    ))
}

/// Write a pixel buffer to an image file.
pub fn write_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let mut img: RgbaImage = ImageBuffer::new(buffer.width() as u32, buffer.height() as u32);

    for (y, row) in buffer.rows().iter().enumerate() {
        for (x, colour) in row.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, Rgba(colour.to_rgba()));
        }
    }

    img.save(path).map_err(|e| IqError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write image: {}", e),
    })?;

    Ok(())
}
