//! Pixel buffer - the rectangular grid every pipeline stage trades in.

use crate::types::Colour;

/// A width x height grid of RGBA samples (row-major: `pixels[y][x]`).
///
/// Buffers are plain values: stages hand them on by move or clone and never
/// share mutable access. All buffers in one pipeline run have the same
/// dimensions unless explicitly cropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<Vec<Colour>>,
    width: usize,
    height: usize,
}

impl PixelBuffer {
    /// Create a buffer from a pixel grid.
    ///
    /// Ragged rows are truncated/padded with transparent pixels to the
    /// first row's width so the invariant `pixels[y].len() == width` holds.
    pub fn new(mut pixels: Vec<Vec<Colour>>) -> Self {
        let height = pixels.len();
        let width = pixels.first().map_or(0, |row| row.len());
        for row in &mut pixels {
            row.resize(width, Colour::TRANSPARENT);
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Create a buffer filled with a single colour.
    pub fn filled(width: usize, height: usize, colour: Colour) -> Self {
        Self {
            pixels: vec![vec![colour; width]; height],
            width,
            height,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as (width, height).
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Whether the buffer has the same dimensions as another.
    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.size() == other.size()
    }

    /// Get a pixel, if in bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<Colour> {
        self.pixels.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Set a pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, colour: Colour) {
        if let Some(row) = self.pixels.get_mut(y) {
            if let Some(px) = row.get_mut(x) {
                *px = colour;
            }
        }
    }

    /// Borrow the pixel grid.
    pub fn rows(&self) -> &[Vec<Colour>] {
        &self.pixels
    }

    /// Build a buffer of the given size from a per-pixel function.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Colour) -> Self {
        let pixels = (0..height)
            .map(|y| (0..width).map(|x| f(x, y)).collect())
            .collect();
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Flatten to an RGBA byte buffer (for image output).
    pub fn to_rgba_buffer(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.width * self.height * 4);
        for row in &self.pixels {
            for colour in row {
                buffer.extend_from_slice(&colour.to_rgba());
            }
        }
        buffer
    }
}
