use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use photo_palette_wasm::{
    DEFAULT_PALETTE, ExtractError, ExtractOptions, PaletteExtractor, TARGET_COLOR_COUNT,
    default_palette, parse_hex, perceptual_distance,
};
use rand::{SeedableRng, rngs::StdRng};

fn solid(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
}

fn split(width: u32, height: u32, left: [u8; 4], right: [u8; 4]) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 { Rgba(left) } else { Rgba(right) }
    });
    DynamicImage::ImageRgba8(img)
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let t = (x + y) as f32 / (width + height - 2) as f32;
        Rgba([(255.0 * (1.0 - t)) as u8, 0, (255.0 * t) as u8, 255])
    });
    DynamicImage::ImageRgba8(img)
}

fn seeded(seed: u64) -> PaletteExtractor {
    PaletteExtractor::new(ExtractOptions::with_seed(seed))
}

fn assert_well_formed(palette: &[String]) {
    assert_eq!(palette.len(), TARGET_COLOR_COUNT);
    for hex in palette {
        assert_eq!(hex.len(), 7, "bad length: {hex}");
        assert!(hex.starts_with('#'), "missing #: {hex}");
        assert!(
            hex[1..].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
            "not uppercase hex: {hex}"
        );
    }
}

#[test]
fn transparent_pixel_yields_default_palette() {
    let img = solid(1, 1, [0, 0, 0, 0]);
    assert_eq!(seeded(1).extract(&img), DEFAULT_PALETTE.map(String::from));
}

#[test]
fn transparent_pixel_reports_insufficient_pixels() {
    let img = solid(1, 1, [0, 0, 0, 0]);
    let mut rng = StdRng::seed_from_u64(1);
    let err = PaletteExtractor::default()
        .try_extract_with_rng(&img, &mut rng)
        .unwrap_err();
    assert!(matches!(err, ExtractError::InsufficientPixels { found: 0, .. }));
}

#[test]
fn gray_image_yields_default_palette() {
    let img = solid(60, 60, [128, 128, 128, 255]);
    assert_eq!(seeded(2).extract(&img), default_palette());
}

#[test]
fn undecodable_bytes_yield_default_palette() {
    assert_eq!(seeded(3).extract_bytes(b"definitely not an image"), default_palette());
}

#[test]
fn solid_color_stays_on_that_color() {
    let img = solid(100, 100, [255, 0, 0, 255]);
    let palette = seeded(4).extract(&img);
    assert_well_formed(&palette);

    let red = parse_hex("#FF0000").unwrap();
    for hex in &palette {
        let c = parse_hex(hex).unwrap();
        assert!(perceptual_distance(c, red) < 5.0, "{hex} strayed from red");
    }
}

#[test]
fn separated_halves_produce_distinct_colors() {
    let img = split(100, 100, [255, 0, 0, 255], [0, 0, 255, 255]);
    let palette = seeded(5).extract(&img);
    assert_well_formed(&palette);

    let mut unique: Vec<&String> = palette.iter().collect();
    unique.sort();
    unique.dedup();
    assert!(unique.len() >= 2);

    let colors: Vec<_> = unique.iter().map(|h| parse_hex(h).unwrap()).collect();
    let separated = colors
        .iter()
        .enumerate()
        .any(|(i, a)| colors[i + 1..].iter().any(|b| perceptual_distance(*a, *b) >= 20.0));
    assert!(separated);
}

#[test]
fn gradient_produces_several_colors() {
    let palette = seeded(6).extract(&gradient(100, 100));
    assert_well_formed(&palette);
    let mut unique = palette.to_vec();
    unique.sort();
    unique.dedup();
    assert!(unique.len() > 1);
}

#[test]
fn same_seed_gives_same_palette() {
    let img = gradient(120, 80);
    assert_eq!(seeded(7).extract(&img), seeded(7).extract(&img));
}

#[test]
fn unseeded_runs_keep_shape() {
    let img = gradient(100, 100);
    let extractor = PaletteExtractor::default();
    for _ in 0..3 {
        assert_well_formed(&extractor.extract(&img));
    }
    assert_well_formed(&photo_palette_wasm::extract_palette(&img));
}

#[test]
fn transparent_region_does_not_influence_result() {
    let half = split(100, 100, [255, 0, 0, 0], [0, 0, 255, 255]);
    let visible = solid(50, 100, [0, 0, 255, 255]);
    assert_eq!(seeded(8).extract(&half), seeded(8).extract(&visible));
}

#[test]
fn transparent_region_does_not_bleed_when_resampled() {
    let half = split(200, 200, [255, 0, 0, 0], [0, 0, 255, 255]);
    let visible = solid(100, 200, [0, 0, 255, 255]);

    let from_half = seeded(8).extract(&half);
    assert!(from_half.iter().all(|hex| hex == "#0000FF"), "{from_half:?}");
    assert_eq!(from_half, seeded(8).extract(&visible));
}

#[test]
fn large_images_are_downscaled() {
    let img = gradient(640, 480);
    assert_well_formed(&seeded(9).extract(&img));
}

#[test]
fn encoded_png_round_trips_through_bytes() {
    let img = split(40, 40, [0, 200, 0, 255], [240, 160, 20, 255]);
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();

    let from_bytes = seeded(10).extract_bytes(&buf);
    let from_image = seeded(10).extract(&img);
    assert_eq!(from_bytes, from_image);
}

#[test]
fn concurrent_extractions_agree() {
    let img = gradient(100, 100);
    let extractor = seeded(11);
    let expected = extractor.extract(&img);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| extractor.extract(&img)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
