//! Copy-move detection: identical textured windows far apart on the page.

use std::collections::HashMap;

use anyhow::{bail, Result};

use super::config::SignalConfig;
use super::plane::{mean_std, window_origins, GrayPlane};

/// Number of hash groups holding at least one pair of distant windows,
/// counted once per member that has a distant later match.
pub fn count_clones(plane: &GrayPlane, config: &SignalConfig) -> Result<u32> {
    if plane.is_empty() {
        bail!("cannot search clones on an empty raster");
    }
    let blurred = gaussian_blur(plane);
    let size = config.clone_block_size;

    let mut groups: HashMap<Vec<u64>, Vec<(u32, u32)>> = HashMap::new();
    for y in window_origins(blurred.height, size, config.clone_step) {
        for x in window_origins(blurred.width, size, config.clone_step) {
            let block = blurred.block(x, y, size);
            let (mean, std) = mean_std(&block);
            // Flat windows (margins, solid fills) all hash alike.
            if std < config.clone_min_std {
                continue;
            }
            groups.entry(mean_hash(&block, mean)).or_default().push((x, y));
        }
    }

    let min_distance = f64::from(size) * config.clone_min_distance_blocks;
    let mut matches = 0u32;
    for locations in groups.values().filter(|locations| locations.len() > 1) {
        for (i, first) in locations.iter().enumerate() {
            if locations[i + 1..]
                .iter()
                .any(|second| distance(*first, *second) > min_distance)
            {
                matches += 1;
            }
        }
    }
    Ok(matches)
}

/// One bit per sample: above the window mean or not.
fn mean_hash(block: &[f64], mean: f64) -> Vec<u64> {
    let mut bits = vec![0u64; block.len().div_ceil(64)];
    for (i, sample) in block.iter().enumerate() {
        if *sample > mean {
            bits[i / 64] |= 1 << (i % 64);
        }
    }
    bits
}

fn distance(a: (u32, u32), b: (u32, u32)) -> f64 {
    let dx = f64::from(a.0) - f64::from(b.0);
    let dy = f64::from(a.1) - f64::from(b.1);
    (dx * dx + dy * dy).sqrt()
}

/// Separable 3×3 Gaussian (`[1, 2, 1] / 4`) with clamped edges.
fn gaussian_blur(plane: &GrayPlane) -> GrayPlane {
    let horizontal = GrayPlane::from_fn(plane.width, plane.height, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        (plane.clamped(x - 1, y) + 2.0 * plane.clamped(x, y) + plane.clamped(x + 1, y)) / 4.0
    });
    GrayPlane::from_fn(plane.width, plane.height, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        (horizontal.clamped(x, y - 1) + 2.0 * horizontal.clamped(x, y) + horizontal.clamped(x, y + 1))
            / 4.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn page_with_stamp(positions: &[(u32, u32)]) -> GrayPlane {
        let mut rng = StdRng::seed_from_u64(7);
        let stamp: Vec<f64> = (0..32 * 32).map(|_| f64::from(rng.gen_range(0u8..=255))).collect();
        GrayPlane::from_fn(256, 256, |x, y| {
            for (px, py) in positions {
                if (*px..px + 32).contains(&x) && (*py..py + 32).contains(&y) {
                    return stamp[((y - py) * 32 + (x - px)) as usize];
                }
            }
            255.0
        })
    }

    #[test]
    fn blank_page_has_no_clones() {
        let plane = GrayPlane::from_fn(256, 256, |_, _| 255.0);
        assert_eq!(count_clones(&plane, &SignalConfig::default()).unwrap(), 0);
    }

    #[test]
    fn single_stamp_is_not_a_clone() {
        let plane = page_with_stamp(&[(16, 16)]);
        assert_eq!(count_clones(&plane, &SignalConfig::default()).unwrap(), 0);
    }

    #[test]
    fn repeated_stamp_is_detected() {
        let plane = page_with_stamp(&[(16, 16), (160, 160)]);
        assert!(count_clones(&plane, &SignalConfig::default()).unwrap() >= 1);
    }

    #[test]
    fn adjacent_repeats_are_ignored() {
        let hash = mean_hash(&[0.0, 10.0, 0.0, 10.0], 5.0);
        assert_eq!(hash, vec![0b1010]);
        assert!(distance((0, 0), (48, 48)) < 96.0);
    }
}
