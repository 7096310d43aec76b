use anyhow::{bail, Result};

use super::config::SignalConfig;
use super::plane::{mean_std, window_origins, GrayPlane};

/// Density of blocks whose variance is an extreme outlier, per thousand
/// blocks. A spliced region rarely shares the grain of the page around it.
pub fn noise_outlier_score(plane: &GrayPlane, config: &SignalConfig) -> Result<f64> {
    if plane.is_empty() {
        bail!("cannot measure noise on an empty raster");
    }
    let size = config.noise_block_size;
    let mut variances = Vec::new();
    for y in window_origins(plane.height, size, size) {
        for x in window_origins(plane.width, size, size) {
            let (_, std) = mean_std(&plane.block(x, y, size));
            variances.push(std * std);
        }
    }
    if variances.is_empty() {
        return Ok(0.0);
    }

    let (mean, std) = mean_std(&variances);
    let cutoff = mean + config.noise_sigma * std;
    let outliers = variances.iter().filter(|v| **v > cutoff).count();
    Ok(outliers as f64 / variances.len() as f64 * config.noise_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_page_has_no_outliers() {
        let plane = GrayPlane::from_fn(128, 128, |_, _| 200.0);
        assert_eq!(noise_outlier_score(&plane, &SignalConfig::default()).unwrap(), 0.0);
    }

    #[test]
    fn single_grainy_block_is_an_outlier() {
        // 15 × 15 scanned blocks, one of them a checkerboard.
        let plane = GrayPlane::from_fn(256, 256, |x, y| {
            if (64..80).contains(&x) && (64..80).contains(&y) {
                if (x + y) % 2 == 0 { 0.0 } else { 255.0 }
            } else {
                128.0
            }
        });
        let score = noise_outlier_score(&plane, &SignalConfig::default()).unwrap();
        assert!((score - 1000.0 / 225.0).abs() < 1e-9, "score {score}");
    }

    #[test]
    fn page_smaller_than_a_block_scores_zero() {
        let plane = GrayPlane::from_fn(8, 8, |x, _| f64::from(x));
        assert_eq!(noise_outlier_score(&plane, &SignalConfig::default()).unwrap(), 0.0);
    }
}
