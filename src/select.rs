//! Choosing a diverse subset of centroids and ordering it by prominence.

use std::cmp::Ordering;

use log::debug;

use crate::color::{HslColor, LabColor, PixelSample, Rgb};

/// Pixels closer than this count towards a color's frequency.
pub const FREQUENCY_RADIUS: f64 = 30.0;
/// Minimum perceptual distance between colors accepted in the diverse pass.
pub const MIN_DELTA_E: f64 = 20.0;

const FREQUENCY_WEIGHT: f64 = 0.6;
const SATURATION_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub color: Rgb,
    pub score: f64,
}

/// Share of `samples` within [`FREQUENCY_RADIUS`] of `color`.
pub fn frequency(color: Rgb, samples: &[PixelSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let lab = LabColor::from_rgb(color);
    let near = samples
        .iter()
        .filter(|s| s.lab.distance(lab) < FREQUENCY_RADIUS)
        .count();
    near as f64 / samples.len() as f64
}

/// Score every centroid and sort best first. Ties keep input order.
pub fn score_centroids(centroids: &[Rgb], samples: &[PixelSample]) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = centroids
        .iter()
        .map(|&color| {
            let saturation = HslColor::from_rgb(color).saturation;
            ScoredCandidate {
                color,
                score: FREQUENCY_WEIGHT * frequency(color, samples) + SATURATION_WEIGHT * saturation,
            }
        })
        .collect();
    scored.sort_by(|a, b| descending(a.score, b.score));
    scored
}

/// Pick exactly `target` colors from `centroids`.
///
/// Passes, each only run while the result is short:
/// 1. best-scored candidates at least [`MIN_DELTA_E`] from everything accepted;
/// 2. any remaining scored candidate not already present;
/// 3. centroids not already present, in their original order;
/// 4. repeats of already selected colors.
///
/// The last pass only triggers when clustering collapsed to fewer than
/// `target` distinct colors, e.g. a single-color image.
pub fn select_diverse(centroids: &[Rgb], samples: &[PixelSample], target: usize) -> Vec<Rgb> {
    let scored = score_centroids(centroids, samples);
    let mut selected: Vec<Rgb> = Vec::with_capacity(target);
    let mut selected_labs: Vec<LabColor> = Vec::with_capacity(target);

    for candidate in &scored {
        if selected.len() >= target {
            break;
        }
        let lab = LabColor::from_rgb(candidate.color);
        if selected_labs.iter().all(|s| s.distance(lab) >= MIN_DELTA_E) {
            selected.push(candidate.color);
            selected_labs.push(lab);
        }
    }

    for candidate in &scored {
        if selected.len() >= target {
            break;
        }
        if !selected.contains(&candidate.color) {
            selected.push(candidate.color);
        }
    }

    for &centroid in centroids {
        if selected.len() >= target {
            break;
        }
        if !selected.contains(&centroid) {
            selected.push(centroid);
        }
    }

    let distinct = selected.len();
    if distinct > 0 && distinct < target {
        debug!("only {distinct} distinct colors, repeating to fill {target} slots");
        for i in 0..target - distinct {
            selected.push(selected[i % distinct]);
        }
    }

    selected
}

/// Order `colors` most visually dominant first.
pub fn sort_by_prominence(colors: &[Rgb], samples: &[PixelSample]) -> Vec<Rgb> {
    let mut ranked: Vec<(Rgb, f64)> = colors
        .iter()
        .map(|&c| {
            let saturation = HslColor::from_rgb(c).saturation;
            (c, frequency(c, samples) * (1.0 + saturation))
        })
        .collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked.into_iter().map(|(c, _)| c).collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
