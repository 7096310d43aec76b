use serde::{Deserialize, Serialize};

/// Configuration for pixel-level forensics with tunable thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Laplacian variance below this marks the page as blurry
    pub blur_threshold: f64,

    /// ELA: JPEG re-encode quality and score blend
    pub ela_quality: u8,
    pub ela_percentile: f64,
    pub ela_percentile_weight: f64,
    /// Subtracted from ELA when the producer is known to recompress
    pub compressed_producer_penalty: f64,
    /// Producer substrings (lowercase) that recompress every raster
    pub compressed_producers: Vec<String>,

    /// Noise floor: block edge and outlier sigma
    pub noise_block_size: u32,
    pub noise_sigma: f64,
    pub noise_scale: f64,

    /// Copy-move: window edge, stride, flat-window cutoff
    pub clone_block_size: u32,
    pub clone_step: u32,
    pub clone_min_std: f64,
    /// Matches closer than this many window edges are the same region
    pub clone_min_distance_blocks: f64,

    /// Sobel magnitude std above this is a luminance anomaly
    pub luminance_std_threshold: f64,

    /// Evidence cutoffs on the merged findings
    pub ela_evidence_threshold: f64,
    pub classifier_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            blur_threshold: 100.0,
            ela_quality: 90,
            ela_percentile: 99.5,
            ela_percentile_weight: 0.7,
            compressed_producer_penalty: 15.0,
            compressed_producers: ["ilovepdf", "smallpdf", "compress", "optimize", "skia", "google"]
                .into_iter()
                .map(String::from)
                .collect(),
            noise_block_size: 16,
            noise_sigma: 4.0,
            noise_scale: 1000.0,
            clone_block_size: 32,
            clone_step: 16,
            clone_min_std: 15.0,
            clone_min_distance_blocks: 3.0,
            luminance_std_threshold: 50.0,
            ela_evidence_threshold: 4.0,
            classifier_threshold: 0.5,
        }
    }
}

impl SignalConfig {
    pub fn is_compressed_producer(&self, producer: &str) -> bool {
        let producer = producer.to_lowercase();
        self.compressed_producers
            .iter()
            .any(|name| producer.contains(name.as_str()))
    }
}
