//! Pixel-level operations backing the evaluator's operator table.
//!
//! All channel arithmetic is done in f64, rounded to the nearest sample and
//! saturated to 0..=255 (adds never wrap, subtracts floor at 0). Binary
//! image operations require identical dimensions; the result takes the left
//! operand's alpha unless the operation defines otherwise.

use palette::{Hsl, IntoColor, Srgb};

use crate::error::{IqError, Result};
use crate::types::{Colour, PixelBuffer};

/// Round and saturate one channel value.
fn sample(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Check that two buffers can be combined elementwise.
fn check_dims(a: &PixelBuffer, b: &PixelBuffer) -> Result<()> {
    if a.same_size(b) {
        Ok(())
    } else {
        Err(IqError::DimensionMismatch {
            width: a.width(),
            height: a.height(),
            other_width: b.width(),
            other_height: b.height(),
            help: Some("iq never resizes implicitly; crop the larger buffer first".to_string()),
        })
    }
}

/// Apply `f` to each RGB channel, preserving alpha.
fn map_rgb(img: &PixelBuffer, f: impl Fn(u8) -> f64) -> PixelBuffer {
    map_pixels(img, |c| Colour::new(sample(f(c.r)), sample(f(c.g)), sample(f(c.b)), c.a))
}

fn map_pixels(img: &PixelBuffer, f: impl Fn(Colour) -> Colour) -> PixelBuffer {
    PixelBuffer::from_fn(img.width(), img.height(), |x, y| {
        f(img.get(x, y).unwrap_or(Colour::TRANSPARENT))
    })
}

/// Combine two buffers per RGB channel; the result keeps `a`'s alpha.
fn zip_rgb(a: &PixelBuffer, b: &PixelBuffer, f: impl Fn(u8, u8) -> f64) -> Result<PixelBuffer> {
    check_dims(a, b)?;
    Ok(PixelBuffer::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get(x, y).unwrap_or(Colour::TRANSPARENT);
        let pb = b.get(x, y).unwrap_or(Colour::TRANSPARENT);
        Colour::new(
            sample(f(pa.r, pb.r)),
            sample(f(pa.g, pb.g)),
            sample(f(pa.b, pb.b)),
            pa.a,
        )
    }))
}

/// Per-channel offset: covers image + scalar and image - scalar.
pub fn shift(img: &PixelBuffer, delta: f64) -> PixelBuffer {
    map_rgb(img, |c| c as f64 + delta)
}

/// Per-channel gain: image * scalar.
pub fn gain(img: &PixelBuffer, factor: f64) -> PixelBuffer {
    map_rgb(img, |c| c as f64 * factor)
}

/// Per-channel division: image / scalar. Zero divisors are an error.
pub fn div_scalar(img: &PixelBuffer, divisor: f64) -> Result<PixelBuffer> {
    if divisor == 0.0 {
        return Err(IqError::Eval {
            message: "division by zero".to_string(),
            help: None,
        });
    }
    Ok(map_rgb(img, |c| c as f64 / divisor))
}

/// Saturating per-channel addition of two images.
pub fn add_images(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer> {
    zip_rgb(a, b, |x, y| x as f64 + y as f64)
}

/// Saturating per-channel subtraction of two images.
pub fn sub_images(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer> {
    zip_rgb(a, b, |x, y| x as f64 - y as f64)
}

/// Multiply blend of two images: `a * b / 255` per channel.
pub fn mul_images(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer> {
    zip_rgb(a, b, |x, y| x as f64 * y as f64 / 255.0)
}

/// Per-channel minimum of two images.
pub fn min_images(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer> {
    zip_rgb(a, b, |x, y| x.min(y) as f64)
}

/// Per-channel maximum of two images.
pub fn max_images(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer> {
    zip_rgb(a, b, |x, y| x.max(y) as f64)
}

/// Per-channel addition of a colour constant.
pub fn add_colour(img: &PixelBuffer, colour: Colour) -> PixelBuffer {
    map_pixels(img, |c| {
        Colour::new(
            sample(c.r as f64 + colour.r as f64),
            sample(c.g as f64 + colour.g as f64),
            sample(c.b as f64 + colour.b as f64),
            c.a,
        )
    })
}

/// Per-channel subtraction of a colour constant.
pub fn sub_colour(img: &PixelBuffer, colour: Colour) -> PixelBuffer {
    map_pixels(img, |c| {
        Colour::new(
            sample(c.r as f64 - colour.r as f64),
            sample(c.g as f64 - colour.g as f64),
            sample(c.b as f64 - colour.b as f64),
            c.a,
        )
    })
}

/// Invert the RGB channels, preserving alpha.
pub fn invert(img: &PixelBuffer) -> PixelBuffer {
    map_pixels(img, Colour::invert)
}

/// Rec. 601 greyscale, preserving alpha.
pub fn grey(img: &PixelBuffer) -> PixelBuffer {
    map_pixels(img, |c| {
        let l = sample(c.luma());
        Colour::new(l, l, l, c.a)
    })
}

/// Linear interpolation between two images across all four channels.
///
/// `t` is clamped to [0, 1]: 0 yields `a`, 1 yields `b`.
pub fn blend(a: &PixelBuffer, b: &PixelBuffer, t: f64) -> Result<PixelBuffer> {
    check_dims(a, b)?;
    let t = t.clamp(0.0, 1.0);
    Ok(PixelBuffer::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get(x, y).unwrap_or(Colour::TRANSPARENT);
        let pb = b.get(x, y).unwrap_or(Colour::TRANSPARENT);
        lerp(pa, pb, t)
    }))
}

/// Interpolate two colours across all four channels.
pub fn lerp(a: Colour, b: Colour, t: f64) -> Colour {
    let inv = 1.0 - t;
    Colour::new(
        sample(a.r as f64 * inv + b.r as f64 * t),
        sample(a.g as f64 * inv + b.g as f64 * t),
        sample(a.b as f64 * inv + b.b as f64 * t),
        sample(a.a as f64 * inv + b.a as f64 * t),
    )
}

/// Mask an image: RGB from `img`, alpha scaled by the mask's luma.
pub fn mask(img: &PixelBuffer, m: &PixelBuffer) -> Result<PixelBuffer> {
    check_dims(img, m)?;
    Ok(PixelBuffer::from_fn(img.width(), img.height(), |x, y| {
        let c = img.get(x, y).unwrap_or(Colour::TRANSPARENT);
        let luma = m.get(x, y).unwrap_or(Colour::TRANSPARENT).luma();
        Colour::new(c.r, c.g, c.b, sample(c.a as f64 * luma / 255.0))
    }))
}

/// Extract a sub-rectangle. The region must lie fully inside the image.
pub fn crop(img: &PixelBuffer, x: usize, y: usize, w: usize, h: usize) -> Result<PixelBuffer> {
    if w == 0 || h == 0 {
        return Err(IqError::Eval {
            message: "crop region is empty".to_string(),
            help: Some("crop width and height must be at least 1".to_string()),
        });
    }
    if x + w > img.width() || y + h > img.height() {
        return Err(IqError::Eval {
            message: format!(
                "crop region {}x{} at ({}, {}) exceeds the {}x{} image",
                w,
                h,
                x,
                y,
                img.width(),
                img.height()
            ),
            help: None,
        });
    }
    Ok(PixelBuffer::from_fn(w, h, |dx, dy| {
        img.get(x + dx, y + dy).unwrap_or(Colour::TRANSPARENT)
    }))
}

/// Move lightness toward 1.0 (positive `amount`) or 0.0 (negative) by the
/// given fraction of the remaining range, in HSL space.
fn adjust_lightness(colour: Colour, amount: f64) -> Colour {
    let rgb: Srgb<f32> = Srgb::new(
        colour.r as f32 / 255.0,
        colour.g as f32 / 255.0,
        colour.b as f32 / 255.0,
    );

    let mut hsl: Hsl = rgb.into_color();

    let delta = amount as f32;
    if delta > 0.0 {
        hsl.lightness += (1.0 - hsl.lightness) * delta;
    } else {
        hsl.lightness += hsl.lightness * delta;
    }
    hsl.lightness = hsl.lightness.clamp(0.0, 1.0);

    let rgb_out: Srgb<f32> = hsl.into_color();
    Colour::new(
        (rgb_out.red * 255.0).round() as u8,
        (rgb_out.green * 255.0).round() as u8,
        (rgb_out.blue * 255.0).round() as u8,
        colour.a,
    )
}

/// Move saturation toward 1.0 (positive `amount`) or 0.0 (negative) by the
/// given fraction of the remaining range, in HSL space.
fn adjust_saturation(colour: Colour, amount: f64) -> Colour {
    let rgb: Srgb<f32> = Srgb::new(
        colour.r as f32 / 255.0,
        colour.g as f32 / 255.0,
        colour.b as f32 / 255.0,
    );

    let mut hsl: Hsl = rgb.into_color();

    let delta = amount as f32;
    if delta > 0.0 {
        hsl.saturation += (1.0 - hsl.saturation) * delta;
    } else {
        hsl.saturation += hsl.saturation * delta;
    }
    hsl.saturation = hsl.saturation.clamp(0.0, 1.0);

    let rgb_out: Srgb<f32> = hsl.into_color();
    Colour::new(
        (rgb_out.red * 255.0).round() as u8,
        (rgb_out.green * 255.0).round() as u8,
        (rgb_out.blue * 255.0).round() as u8,
        colour.a,
    )
}

/// Lighten every pixel by a fraction in [0, 1].
pub fn lighten(img: &PixelBuffer, amount: f64) -> PixelBuffer {
    let amount = amount.clamp(0.0, 1.0);
    map_pixels(img, |c| adjust_lightness(c, amount))
}

/// Darken every pixel by a fraction in [0, 1].
pub fn darken(img: &PixelBuffer, amount: f64) -> PixelBuffer {
    let amount = amount.clamp(0.0, 1.0);
    map_pixels(img, |c| adjust_lightness(c, -amount))
}

/// Saturate every pixel by a fraction in [0, 1].
pub fn saturate(img: &PixelBuffer, amount: f64) -> PixelBuffer {
    let amount = amount.clamp(0.0, 1.0);
    map_pixels(img, |c| adjust_saturation(c, amount))
}

/// Desaturate every pixel by a fraction in [0, 1].
pub fn desaturate(img: &PixelBuffer, amount: f64) -> PixelBuffer {
    let amount = amount.clamp(0.0, 1.0);
    map_pixels(img, |c| adjust_saturation(c, -amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: usize, h: usize, c: Colour) -> PixelBuffer {
        PixelBuffer::filled(w, h, c)
    }

    #[test]
    fn test_shift_saturates_both_ends() {
        let img = solid(2, 2, Colour::rgb(250, 10, 128));
        let up = shift(&img, 20.0);
        assert_eq!(up.get(0, 0), Some(Colour::rgb(255, 30, 148)));

        let down = shift(&img, -20.0);
        assert_eq!(down.get(0, 0), Some(Colour::rgb(230, 0, 108)));
    }

    #[test]
    fn test_shift_preserves_alpha() {
        let img = solid(1, 1, Colour::new(100, 100, 100, 42));
        assert_eq!(shift(&img, 50.0).get(0, 0).unwrap().a, 42);
    }

    #[test]
    fn test_gain_rounds_to_nearest() {
        let img = solid(1, 1, Colour::rgb(3, 5, 7));
        let out = gain(&img, 0.5);
        // 1.5 -> 2, 2.5 -> 3 (round half away from zero), 3.5 -> 4
        assert_eq!(out.get(0, 0), Some(Colour::rgb(2, 3, 4)));
    }

    #[test]
    fn test_div_scalar_by_zero() {
        let img = solid(1, 1, Colour::WHITE);
        assert!(matches!(
            div_scalar(&img, 0.0).unwrap_err(),
            IqError::Eval { .. }
        ));
    }

    #[test]
    fn test_add_images_saturates() {
        let a = solid(1, 1, Colour::rgb(200, 0, 100));
        let b = solid(1, 1, Colour::rgb(100, 50, 100));
        let out = add_images(&a, &b).unwrap();
        assert_eq!(out.get(0, 0), Some(Colour::rgb(255, 50, 200)));
    }

    #[test]
    fn test_image_ops_check_dimensions() {
        let a = solid(2, 2, Colour::WHITE);
        let b = solid(3, 2, Colour::WHITE);
        assert!(matches!(
            add_images(&a, &b).unwrap_err(),
            IqError::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn test_mul_images_extremes() {
        let img = solid(1, 1, Colour::rgb(137, 42, 250));
        assert_eq!(
            mul_images(&img, &solid(1, 1, Colour::WHITE)).unwrap().get(0, 0),
            Some(Colour::rgb(137, 42, 250))
        );
        assert_eq!(
            mul_images(&img, &solid(1, 1, Colour::BLACK)).unwrap().get(0, 0),
            Some(Colour::rgb(0, 0, 0))
        );
    }

    #[test]
    fn test_invert_round_trips() {
        let img = solid(2, 1, Colour::new(10, 200, 77, 128));
        assert_eq!(invert(&invert(&img)), img);
    }

    #[test]
    fn test_grey_is_uniform() {
        let out = grey(&solid(1, 1, Colour::rgb(255, 0, 0)));
        let c = out.get(0, 0).unwrap();
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
        assert_eq!(c.r, 76); // 0.299 * 255 rounded
    }

    #[test]
    fn test_blend_endpoints() {
        let a = solid(1, 1, Colour::rgb(0, 0, 0));
        let b = solid(1, 1, Colour::rgb(255, 255, 255));
        assert_eq!(blend(&a, &b, 0.0).unwrap(), a);
        assert_eq!(blend(&a, &b, 1.0).unwrap(), b);

        let mid = blend(&a, &b, 0.5).unwrap().get(0, 0).unwrap();
        assert_eq!(mid.r, 128); // 127.5 rounds up
    }

    #[test]
    fn test_blend_clamps_t() {
        let a = solid(1, 1, Colour::BLACK);
        let b = solid(1, 1, Colour::WHITE);
        assert_eq!(blend(&a, &b, 7.0).unwrap(), b);
        assert_eq!(blend(&a, &b, -2.0).unwrap(), a);
    }

    #[test]
    fn test_mask_scales_alpha() {
        let img = solid(1, 1, Colour::rgb(10, 20, 30));
        let white_mask = solid(1, 1, Colour::WHITE);
        let black_mask = solid(1, 1, Colour::BLACK);

        assert_eq!(mask(&img, &white_mask).unwrap().get(0, 0).unwrap().a, 255);
        assert_eq!(mask(&img, &black_mask).unwrap().get(0, 0).unwrap().a, 0);
    }

    #[test]
    fn test_crop_extracts_region() {
        let img = PixelBuffer::from_fn(4, 4, |x, y| {
            if x >= 2 && y >= 2 {
                Colour::WHITE
            } else {
                Colour::BLACK
            }
        });
        let out = crop(&img, 2, 2, 2, 2).unwrap();
        assert_eq!(out.size(), (2, 2));
        assert_eq!(out.get(0, 0), Some(Colour::WHITE));
    }

    #[test]
    fn test_crop_bounds() {
        let img = solid(4, 4, Colour::WHITE);
        assert!(crop(&img, 3, 0, 2, 1).is_err());
        assert!(crop(&img, 0, 0, 0, 1).is_err());
        assert!(crop(&img, 0, 0, 4, 4).is_ok());
    }

    #[test]
    fn test_darken_and_lighten_move_toward_extremes() {
        let grey_img = solid(1, 1, Colour::rgb(128, 128, 128));

        let darker = darken(&grey_img, 0.5).get(0, 0).unwrap();
        assert!(darker.r < 128);

        let lighter = lighten(&grey_img, 0.5).get(0, 0).unwrap();
        assert!(lighter.r > 128);
    }

    #[test]
    fn test_desaturate_fully_is_greyscale() {
        let out = desaturate(&solid(1, 1, Colour::rgb(255, 100, 100)), 1.0);
        let c = out.get(0, 0).unwrap();
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }
}
