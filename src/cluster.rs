//! Saturation-weighted k-means in perceptual space.
//!
//! Seeding starts from the most saturated pixel and adds the rest k-means++
//! style (probability proportional to squared distance to the nearest chosen
//! centroid). Lloyd iterations then move each centroid to the mean of its
//! members, weighting every pixel by `1 + saturation`.

use log::debug;
use palette::Srgb;
use rand::Rng;

use crate::color::{LabColor, PixelSample, Rgb};

pub const CLUSTER_COUNT: usize = 12;
pub const MAX_ITERATIONS: usize = 25;
/// Iteration stops once no centroid moves this far.
pub const CONVERGENCE_DISTANCE: f64 = 3.0;

/// Centroids used when there is nothing to cluster.
pub const DEFAULT_CENTROIDS: [Rgb; 6] = [
    Srgb::new(231, 76, 60),
    Srgb::new(52, 152, 219),
    Srgb::new(46, 204, 113),
    Srgb::new(243, 156, 18),
    Srgb::new(155, 89, 182),
    Srgb::new(26, 188, 156),
];

/// Run the clusterer and return `k` centroid colors.
///
/// An empty `samples` slice yields [`DEFAULT_CENTROIDS`] instead.
pub fn cluster<R: Rng + ?Sized>(
    samples: &[PixelSample],
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Vec<Rgb> {
    if samples.is_empty() {
        return DEFAULT_CENTROIDS.to_vec();
    }

    let seeds = seed_centroids(samples, k, rng);
    let (centroids, _) = refine(samples, seeds, max_iterations);
    centroids
}

/// Weighted Lloyd iterations starting from `centroids`.
///
/// Returns the final centroids and the number of iterations run. Stops early
/// once every centroid moved less than [`CONVERGENCE_DISTANCE`]; a centroid
/// with no members keeps its previous value.
pub fn refine(
    samples: &[PixelSample],
    mut centroids: Vec<Rgb>,
    max_iterations: usize,
) -> (Vec<Rgb>, usize) {
    let mut labs: Vec<LabColor> = centroids.iter().map(|&c| LabColor::from_rgb(c)).collect();
    let mut iterations = 0;

    while iterations < max_iterations {
        let mut sums = vec![WeightedSum::default(); centroids.len()];
        for sample in samples {
            sums[nearest(sample.lab, &labs)].add(sample);
        }

        let next: Vec<Rgb> = sums
            .iter()
            .zip(&centroids)
            .map(|(sum, &prev)| sum.mean().unwrap_or(prev))
            .collect();
        let next_labs: Vec<LabColor> = next.iter().map(|&c| LabColor::from_rgb(c)).collect();

        let converged = labs
            .iter()
            .zip(&next_labs)
            .all(|(old, new)| old.distance(*new) < CONVERGENCE_DISTANCE);

        centroids = next;
        labs = next_labs;
        iterations += 1;

        if converged {
            debug!("k-means converged at iteration {iterations}");
            break;
        }
    }

    (centroids, iterations)
}

/// Pick `k` starting centroids from `samples`. Empty when `samples` is empty
/// or `k` is zero.
pub fn seed_centroids<R: Rng + ?Sized>(samples: &[PixelSample], k: usize, rng: &mut R) -> Vec<Rgb> {
    if k == 0 {
        return Vec::new();
    }
    let Some(first) = samples
        .iter()
        .reduce(|best, s| if s.saturation > best.saturation { s } else { best })
    else {
        return Vec::new();
    };

    let mut centroids = Vec::with_capacity(k);
    centroids.push(first.rgb);

    // Squared distance from each sample to its nearest chosen centroid,
    // updated incrementally as centroids are added.
    let mut weights: Vec<f64> = samples
        .iter()
        .map(|s| squared(s.lab.distance(first.lab)))
        .collect();

    while centroids.len() < k {
        let total: f64 = weights.iter().sum();
        let picked = if total > 0.0 {
            roulette(&weights, rng.random_range(0.0..total))
        } else {
            None
        };
        let index = picked.unwrap_or_else(|| rng.random_range(0..samples.len()));

        let chosen = samples[index];
        centroids.push(chosen.rgb);
        for (w, s) in weights.iter_mut().zip(samples) {
            *w = w.min(squared(s.lab.distance(chosen.lab)));
        }
    }

    centroids
}

/// Index of the first entry at which the running sum of `weights` reaches `threshold`.
fn roulette(weights: &[f64], threshold: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative >= threshold {
            return Some(i);
        }
    }
    None
}

fn nearest(lab: LabColor, centroids: &[LabColor]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = lab.distance(*c);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

#[inline]
fn squared(x: f64) -> f64 {
    x * x
}

#[derive(Clone, Copy, Default)]
struct WeightedSum {
    r: f64,
    g: f64,
    b: f64,
    weight: f64,
}

impl WeightedSum {
    fn add(&mut self, sample: &PixelSample) {
        let w = 1.0 + sample.saturation;
        self.r += sample.rgb.red as f64 * w;
        self.g += sample.rgb.green as f64 * w;
        self.b += sample.rgb.blue as f64 * w;
        self.weight += w;
    }

    fn mean(&self) -> Option<Rgb> {
        if self.weight == 0.0 {
            return None;
        }
        Some(Srgb::new(
            (self.r / self.weight) as u8,
            (self.g / self.weight) as u8,
            (self.b / self.weight) as u8,
        ))
    }
}
