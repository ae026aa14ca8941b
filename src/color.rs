//! Color value types and the conversions the extraction stages share.

use palette::{Hsl, IntoColor, LinSrgb, Srgb};

use crate::error::ExtractError;

/// An opaque 8-bit sRGB pixel or centroid.
pub type Rgb = Srgb<u8>;

/// D65 reference white.
const WHITE_X: f64 = 0.95047;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.08883;

/// Weight applied to the lightness difference in [`LabColor::distance`].
const LIGHTNESS_WEIGHT: f64 = 0.5;

/// Hue/saturation/lightness view of a pixel.
///
/// * `hue`: degrees in `[0, 360)`
/// * `saturation`: `[0, 1]`
/// * `lightness`: `[0, 255]`, scaled to match the integer channel domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslColor {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl HslColor {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let hsl: Hsl<palette::encoding::Srgb, f64> = rgb.into_format::<f64>().into_color();
        Self {
            hue: hsl.hue.into_positive_degrees(),
            saturation: hsl.saturation,
            lightness: hsl.lightness * 255.0,
        }
    }
}

/// CIE L*a*b* relative to D65. `l` is in `[0, 100]`, `a`/`b` are unbounded
/// but stay roughly within `[-128, 128]` for sRGB inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let linear: LinSrgb<f64> = rgb.into_format::<f64>().into_linear();
        let (r, g, b) = (linear.red, linear.green, linear.blue);

        let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
        let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
        let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

        let fx = lab_f(x / WHITE_X);
        let fy = lab_f(y / WHITE_Y);
        let fz = lab_f(z / WHITE_Z);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Perceptual distance with lightness de-emphasized, so hue and chroma
    /// differences dominate.
    pub fn distance(self, other: Self) -> f64 {
        let dl = (self.l - other.l) * LIGHTNESS_WEIGHT;
        let da = self.a - other.a;
        let db = self.b - other.b;
        (dl * dl + da * da + db * db).sqrt()
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Perceptual distance between two sRGB colors.
pub fn perceptual_distance(a: Rgb, b: Rgb) -> f64 {
    LabColor::from_rgb(a).distance(LabColor::from_rgb(b))
}

/// A filtered pixel with the derived values every later stage needs.
#[derive(Debug, Clone, Copy)]
pub struct PixelSample {
    pub rgb: Rgb,
    pub lab: LabColor,
    pub saturation: f64,
}

impl PixelSample {
    pub fn new(rgb: Rgb) -> Self {
        Self {
            rgb,
            lab: LabColor::from_rgb(rgb),
            saturation: HslColor::from_rgb(rgb).saturation,
        }
    }
}

/// Format as uppercase `#RRGGBB`.
pub fn to_hex(c: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
}

/// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
pub fn parse_hex(s: &str) -> Result<Rgb, ExtractError> {
    let invalid = || ExtractError::InvalidHex(s.to_string());
    let hex = s.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
            let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
            let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
            Ok(Srgb::new(r, g, b))
        }
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
            let r = nibble(0).map_err(|_| invalid())?;
            let g = nibble(1).map_err(|_| invalid())?;
            let b = nibble(2).map_err(|_| invalid())?;
            Ok(Srgb::new(r, g, b))
        }
        _ => Err(invalid()),
    }
}
