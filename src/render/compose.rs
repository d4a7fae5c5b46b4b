//! Layer compositing - the final pipeline stage.
//!
//! Layers are combined in ascending z-order (ties keep evaluation order)
//! onto an opaque white accumulator sized to the first layer. Each layer's
//! blend mode produces the blended pixel, then the layer's opacity
//! interpolates between the accumulator and the blended pixel across all
//! four channels. A fully opaque `normal` layer therefore composites to
//! exactly its own buffer, and an opacity-0 layer leaves the accumulator
//! untouched.

use crate::error::{IqError, Result};
use crate::types::{Colour, Layer, PixelBuffer};

/// Side length of the canvas returned when no layers were produced.
pub const DEFAULT_CANVAS_SIZE: usize = 255;

/// Background colour of the accumulator and the default canvas.
pub const BACKGROUND: Colour = Colour::WHITE;

/// Composite the ordered layer collection into one buffer.
///
/// An empty collection yields the documented default canvas: an opaque
/// white `DEFAULT_CANVAS_SIZE` square. Input layers are not mutated.
pub fn combine_layers(layers: &[Layer]) -> Result<PixelBuffer> {
    if layers.is_empty() {
        return Ok(PixelBuffer::filled(
            DEFAULT_CANVAS_SIZE,
            DEFAULT_CANVAS_SIZE,
            BACKGROUND,
        ));
    }

    let mut ordered: Vec<&Layer> = layers.iter().collect();
    // Stable: equal z keeps evaluation order.
    ordered.sort_by_key(|layer| layer.z);

    let (width, height) = ordered[0].buffer.size();
    let mut acc = PixelBuffer::filled(width, height, BACKGROUND);

    for layer in ordered {
        if !layer.buffer.same_size(&acc) {
            return Err(IqError::DimensionMismatch {
                width,
                height,
                other_width: layer.buffer.width(),
                other_height: layer.buffer.height(),
                help: Some(format!(
                    "layer '{}' does not match the canvas; iq never resizes implicitly",
                    layer.name
                )),
            });
        }
        acc = composite_one(&acc, layer);
    }

    Ok(acc)
}

fn composite_one(acc: &PixelBuffer, layer: &Layer) -> PixelBuffer {
    let opacity = layer.opacity.clamp(0.0, 1.0);
    PixelBuffer::from_fn(acc.width(), acc.height(), |x, y| {
        let under = acc.get(x, y).unwrap_or(BACKGROUND);
        let over = layer.buffer.get(x, y).unwrap_or(Colour::TRANSPARENT);
        let blended = layer.mode.apply(under, over);
        lerp(under, blended, opacity)
    })
}

/// Interpolate all four channels, rounding to the nearest sample.
fn lerp(a: Colour, b: Colour, t: f64) -> Colour {
    let channel = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
    Colour::new(
        channel(a.r, b.r),
        channel(a.g, b.g),
        channel(a.b, b.b),
        channel(a.a, b.a),
    )
}
