use image::DynamicImage;

/// Row-major grayscale samples as `f64`, the working form of every
/// spatial check.
#[derive(Debug, Clone)]
pub struct GrayPlane {
    pub width: u32,
    pub height: u32,
    data: Vec<f64>,
}

impl GrayPlane {
    pub fn from_image(image: &DynamicImage) -> Self {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        let data = luma.into_raw().into_iter().map(f64::from).collect();
        Self { width, height, data }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f64) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    #[inline]
    pub fn at(&self, x: u32, y: u32) -> f64 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Sample with coordinates clamped to the plane edges.
    #[inline]
    pub fn clamped(&self, x: i64, y: i64) -> f64 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.at(x, y)
    }

    /// Samples of the `size × size` block whose top-left corner is `(x, y)`.
    pub fn block(&self, x: u32, y: u32, size: u32) -> Vec<f64> {
        let mut out = Vec::with_capacity(size as usize * size as usize);
        for row in y..y + size {
            let start = row as usize * self.width as usize + x as usize;
            out.extend_from_slice(&self.data[start..start + size as usize]);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Population mean and standard deviation.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Top-left corners of `size` windows stepped by `step`, excluding a window
/// flush with the far edge.
pub fn window_origins(extent: u32, size: u32, step: u32) -> impl Iterator<Item = u32> {
    (0..extent.saturating_sub(size)).step_by(step.max(1) as usize)
}
