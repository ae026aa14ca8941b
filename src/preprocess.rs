//! Downscaling and pixel filtering ahead of clustering.

use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};
use log::debug;
use palette::Srgb;

use crate::color::{HslColor, Rgb};
use crate::error::ExtractError;

/// Longest side of the working bitmap.
pub const MAX_DIMENSION: u32 = 100;
/// Pixels at or below this alpha are ignored.
pub const ALPHA_THRESHOLD: u8 = 128;
/// Fewer filtered pixels than this and the image is treated as unusable.
pub const MIN_VALID_PIXELS: usize = 10;

const DARK_LIGHTNESS: f64 = 15.0;
const DARK_MIN_SATURATION: f64 = 0.15;
const BRIGHT_LIGHTNESS: f64 = 240.0;
const MIDTONE_RANGE: (f64, f64) = (30.0, 210.0);
const MIDTONE_MIN_SATURATION: f64 = 0.08;

/// Shrink `img` so its longest side is at most `max_dimension`, keeping the
/// aspect ratio. Images already small enough are returned unscaled.
pub fn downscale(img: &DynamicImage, max_dimension: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return RgbaImage::new(0, 0);
    }

    let max = max_dimension.max(1) as f64;
    let scale = (max / w as f64).min(max / h as f64).min(1.0);
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * scale) as u32).max(1);

    let mut rgba = img.to_rgba8();
    if new_w == w && new_h == h {
        return rgba;
    }

    // Resample premultiplied so transparent pixels contribute no color.
    premultiply(&mut rgba);
    let mut resized = image::imageops::resize(&rgba, new_w, new_h, FilterType::Triangle);
    unpremultiply(&mut resized);
    resized
}

fn premultiply(img: &mut RgbaImage) {
    for p in img.pixels_mut() {
        let a = p[3] as u32;
        for c in 0..3 {
            p[c] = ((p[c] as u32 * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(img: &mut RgbaImage) {
    for p in img.pixels_mut() {
        let a = p[3] as u32;
        for c in 0..3 {
            p[c] = if a == 0 {
                0
            } else {
                ((p[c] as u32 * 255 + a / 2) / a).min(255) as u8
            };
        }
    }
}

/// Whether a pixel carries useful color, judged on its HSL values.
pub fn is_useful(hsl: &HslColor) -> bool {
    if hsl.lightness < DARK_LIGHTNESS {
        return hsl.saturation > DARK_MIN_SATURATION;
    }
    if hsl.lightness > BRIGHT_LIGHTNESS {
        return false;
    }
    let (lo, hi) = MIDTONE_RANGE;
    if hsl.lightness > lo && hsl.lightness < hi && hsl.saturation < MIDTONE_MIN_SATURATION {
        return false;
    }
    true
}

/// Collect the substantially opaque, useful pixels of `img` in row-major order.
pub fn filter_pixels(img: &RgbaImage) -> Vec<Rgb> {
    img.pixels()
        .filter(|p| p[3] > ALPHA_THRESHOLD)
        .map(|p| Srgb::new(p[0], p[1], p[2]))
        .filter(|&rgb| is_useful(&HslColor::from_rgb(rgb)))
        .collect()
}

/// Downscale and filter, failing when too little usable color remains.
pub fn preprocess(img: &DynamicImage, max_dimension: u32) -> Result<Vec<Rgb>, ExtractError> {
    let working = downscale(img, max_dimension);
    let total = working.width() as usize * working.height() as usize;
    if total == 0 {
        return Err(ExtractError::EmptyImage);
    }

    let pixels = filter_pixels(&working);
    debug!("filtered: {} valid pixels from {}", pixels.len(), total);

    if pixels.len() < MIN_VALID_PIXELS {
        return Err(ExtractError::InsufficientPixels {
            found: pixels.len(),
            required: MIN_VALID_PIXELS,
        });
    }
    Ok(pixels)
}
