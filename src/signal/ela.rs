//! Error level analysis: regions pasted from another source recompress
//! differently from the rest of the page.

use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use super::config::SignalConfig;

/// Sum of the three channel differences, so 0..=765.
const LEVELS: usize = 766;

pub fn error_level(image: &DynamicImage, compressed: bool, config: &SignalConfig) -> Result<f64> {
    let original = image.to_rgb8();
    let (width, height) = original.dimensions();
    if width == 0 || height == 0 {
        bail!("cannot run ELA on an empty raster");
    }

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, config.ela_quality)
        .encode_image(&original)
        .context("failed to re-encode page as JPEG")?;
    let resaved = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)
        .context("failed to decode re-encoded page")?
        .to_rgb8();
    if resaved.dimensions() != (width, height) {
        bail!("re-encoded page changed size");
    }

    let mut histogram = [0u64; LEVELS];
    for (a, b) in original.pixels().zip(resaved.pixels()) {
        let level: usize = a
            .0
            .iter()
            .zip(b.0.iter())
            .map(|(x, y)| usize::from(x.abs_diff(*y)))
            .sum();
        histogram[level] += 1;
    }

    let score = blend(&histogram, config);
    Ok(if compressed {
        (score - config.compressed_producer_penalty).max(0.0)
    } else {
        score
    })
}

/// `w · percentile + (1 − w) · mean` over per-pixel channel averages.
fn blend(histogram: &[u64; LEVELS], config: &SignalConfig) -> f64 {
    let count: u64 = histogram.iter().sum();
    let total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, n)| level as f64 * *n as f64)
        .sum();
    let mean = total / count as f64 / 3.0;
    let weight = config.ela_percentile_weight;
    weight * percentile(histogram, count, config.ela_percentile) + (1.0 - weight) * mean
}

/// Linear-interpolated percentile, matching the usual `(n − 1)` rank rule.
fn percentile(histogram: &[u64; LEVELS], count: u64, pct: f64) -> f64 {
    let rank = pct / 100.0 * (count - 1) as f64;
    let lower = rank.floor() as u64;
    let upper = rank.ceil() as u64;
    let fraction = rank - lower as f64;
    let low = nth_level(histogram, lower);
    let high = nth_level(histogram, upper);
    (low + (high - low) * fraction) / 3.0
}

/// Value of the `k`-th smallest sample (0-based).
fn nth_level(histogram: &[u64; LEVELS], k: u64) -> f64 {
    let mut seen = 0u64;
    for (level, n) in histogram.iter().enumerate() {
        seen += n;
        if seen > k {
            return level as f64;
        }
    }
    (LEVELS - 1) as f64
}
