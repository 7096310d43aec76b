//! Derivative-based checks: focus (Laplacian) and lighting consistency (Sobel).

use anyhow::{bail, Result};

use super::plane::{mean_std, GrayPlane};

/// 5-tap Sobel: derivative and smoothing halves.
const SOBEL_DERIV: [f64; 5] = [-1.0, -2.0, 0.0, 2.0, 1.0];
const SOBEL_SMOOTH: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];

/// Variance of the 4-neighbour Laplacian over interior pixels.
pub fn laplacian_variance(plane: &GrayPlane) -> Result<f64> {
    if plane.width < 3 || plane.height < 3 {
        bail!("raster too small for Laplacian ({}×{})", plane.width, plane.height);
    }
    let mut responses = Vec::with_capacity((plane.width as usize - 2) * (plane.height as usize - 2));
    for y in 1..plane.height - 1 {
        for x in 1..plane.width - 1 {
            let response = plane.at(x - 1, y) + plane.at(x + 1, y) + plane.at(x, y - 1)
                + plane.at(x, y + 1)
                - 4.0 * plane.at(x, y);
            responses.push(response);
        }
    }
    let (_, std) = mean_std(&responses);
    Ok(std * std)
}

/// Standard deviation of the 5×5 Sobel gradient magnitude over interior pixels.
pub fn gradient_magnitude_std(plane: &GrayPlane) -> Result<f64> {
    if plane.width < 5 || plane.height < 5 {
        bail!("raster too small for Sobel ({}×{})", plane.width, plane.height);
    }
    let mut magnitudes = Vec::with_capacity((plane.width as usize - 4) * (plane.height as usize - 4));
    for y in 2..plane.height - 2 {
        for x in 2..plane.width - 2 {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (j, smooth_y) in SOBEL_SMOOTH.iter().enumerate() {
                for (i, smooth_x) in SOBEL_SMOOTH.iter().enumerate() {
                    let sample = plane.at(x + i as u32 - 2, y + j as u32 - 2);
                    gx += sample * SOBEL_DERIV[i] * smooth_y;
                    gy += sample * SOBEL_DERIV[j] * smooth_x;
                }
            }
            magnitudes.push((gx * gx + gy * gy).sqrt());
        }
    }
    let (_, std) = mean_std(&magnitudes);
    Ok(std)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> GrayPlane {
        GrayPlane::from_fn(size, size, |x, y| if (x + y) % 2 == 0 { 0.0 } else { 255.0 })
    }

    #[test]
    fn flat_plane_has_zero_laplacian_variance() {
        let plane = GrayPlane::from_fn(16, 16, |_, _| 128.0);
        assert_eq!(laplacian_variance(&plane).unwrap(), 0.0);
    }

    #[test]
    fn sharp_texture_has_high_laplacian_variance() {
        assert!(laplacian_variance(&checkerboard(16)).unwrap() > 100.0);
    }

    #[test]
    fn hard_lighting_edge_spreads_gradient() {
        let flat = GrayPlane::from_fn(32, 32, |_, _| 90.0);
        let split = GrayPlane::from_fn(32, 32, |x, _| if x < 16 { 0.0 } else { 255.0 });
        assert_eq!(gradient_magnitude_std(&flat).unwrap(), 0.0);
        assert!(gradient_magnitude_std(&split).unwrap() > 50.0);
    }

    #[test]
    fn tiny_rasters_are_errors() {
        let plane = GrayPlane::from_fn(2, 2, |_, _| 0.0);
        assert!(laplacian_variance(&plane).is_err());
        assert!(gradient_magnitude_std(&plane).is_err());
    }
}
