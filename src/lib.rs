use wasm_bindgen::prelude::*;
use image::{DynamicImage, GenericImageView};
use js_sys::Array;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

pub mod cluster;
pub mod color;
pub mod error;
pub mod preprocess;
pub mod select;

pub use color::{HslColor, LabColor, PixelSample, Rgb, parse_hex, perceptual_distance, to_hex};
pub use error::ExtractError;

/// Number of colors in every extracted palette.
pub const TARGET_COLOR_COUNT: usize = 6;

/// Returned whenever the image cannot provide enough usable color.
pub const DEFAULT_PALETTE: [&str; TARGET_COLOR_COUNT] =
    ["#E74C3C", "#3498DB", "#2ECC71", "#F39C12", "#9B59B6", "#1ABC9C"];

/// Six uppercase `#RRGGBB` strings, most prominent first.
pub type PaletteHex = [String; TARGET_COLOR_COUNT];

pub fn default_palette() -> PaletteHex {
    DEFAULT_PALETTE.map(String::from)
}

// ------------------------------------------------------------
// Options
// ------------------------------------------------------------

/// Tunables for [`PaletteExtractor`]. The defaults are what the engine was
/// calibrated with; only `seed` is normally worth changing.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Longest side of the working bitmap.
    pub max_dimension: u32,
    /// Number of k-means clusters before selection.
    pub cluster_count: usize,
    /// Cap on Lloyd iterations.
    pub max_iterations: usize,
    /// Fixed seed for reproducible output; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_dimension: preprocess::MAX_DIMENSION,
            cluster_count: cluster::CLUSTER_COUNT,
            max_iterations: cluster::MAX_ITERATIONS,
            seed: None,
        }
    }
}

impl ExtractOptions {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

// ------------------------------------------------------------
// Engine
// ------------------------------------------------------------

/// Stateless palette extractor. Cheap to clone and safe to use from any
/// number of threads; every call owns its intermediate state.
#[derive(Clone, Debug, Default)]
pub struct PaletteExtractor {
    options: ExtractOptions,
}

impl PaletteExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    fn rng(&self) -> StdRng {
        match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Extract a palette, falling back to [`DEFAULT_PALETTE`] on degenerate input.
    pub fn extract(&self, img: &DynamicImage) -> PaletteHex {
        self.extract_with_rng(img, &mut self.rng())
    }

    /// Like [`extract`](Self::extract) but with caller-supplied entropy.
    pub fn extract_with_rng<R: Rng + ?Sized>(&self, img: &DynamicImage, rng: &mut R) -> PaletteHex {
        match self.try_extract_with_rng(img, rng) {
            Ok(palette) => palette,
            Err(e) => {
                warn!("using default palette: {e}");
                default_palette()
            }
        }
    }

    /// Decode `input` (PNG, JPEG, ...) and extract its palette.
    pub fn extract_bytes(&self, input: &[u8]) -> PaletteHex {
        match image::load_from_memory(input) {
            Ok(img) => self.extract(&img),
            Err(e) => {
                warn!("using default palette: {}", ExtractError::from(e));
                default_palette()
            }
        }
    }

    /// Run the pipeline, reporting why it could not produce a palette of its own.
    pub fn try_extract_with_rng<R: Rng + ?Sized>(
        &self,
        img: &DynamicImage,
        rng: &mut R,
    ) -> Result<PaletteHex, ExtractError> {
        let (w, h) = img.dimensions();
        info!("extracting palette from {w}x{h} image");

        let pixels = preprocess::preprocess(img, self.options.max_dimension)?;
        let samples: Vec<PixelSample> = pixels.into_iter().map(PixelSample::new).collect();
        debug!("clustering {} valid pixels", samples.len());

        let centroids = cluster::cluster(
            &samples,
            self.options.cluster_count.max(1),
            self.options.max_iterations,
            rng,
        );
        let selected = select::select_diverse(&centroids, &samples, TARGET_COLOR_COUNT);
        let sorted = select::sort_by_prominence(&selected, &samples);

        let hex: Vec<String> = sorted.into_iter().map(to_hex).collect();
        debug!("extracted palette: {hex:?}");
        Ok(hex.try_into().unwrap_or_else(|short: Vec<String>| {
            warn!("selection returned {} colors, using default palette", short.len());
            default_palette()
        }))
    }
}

/// Extract a palette with default options and OS entropy.
pub fn extract_palette(img: &DynamicImage) -> PaletteHex {
    PaletteExtractor::default().extract(img)
}

/// Extract six `#RRGGBB` colors from an encoded image.
///
/// Never throws: undecodable or colorless images produce the default palette.
/// Pass `seed` for reproducible output.
#[wasm_bindgen]
pub fn extract_palette_wasm(input: Vec<u8>, seed: Option<u32>) -> Array {
    let options = ExtractOptions {
        seed: seed.map(u64::from),
        ..ExtractOptions::default()
    };
    let palette = PaletteExtractor::new(options).extract_bytes(&input);

    let out = Array::new();
    for hex in palette {
        out.push(&JsValue::from_str(&hex));
    }
    out
}
