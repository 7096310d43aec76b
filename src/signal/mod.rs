//! Pixel-level forensics on one page raster.
//!
//! Every sub-check is fallible on its own. A failing check degrades to its
//! neutral value and the page still gets a result.

pub mod classifier;
pub mod clones;
pub mod config;
pub mod ela;
pub mod gradient;
pub mod noise;
pub mod plane;

use std::sync::Arc;

use image::DynamicImage;

use crate::models::{codes, Evidence, PageSignal, SignalFindings};
use crate::utils::or_neutral;

pub use classifier::ForgeryClassifier;
pub use config::SignalConfig;

use self::plane::GrayPlane;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::signal";

use crate::log_debug;

/// Per-run facts the signal checks depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalContext {
    /// The container was written by a tool that recompresses every raster.
    pub is_compressed_producer: bool,
}

#[derive(Clone, Default)]
pub struct SignalForensicEngine {
    config: SignalConfig,
    classifier: Option<Arc<dyn ForgeryClassifier>>,
}

impl SignalForensicEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ForgeryClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Context for a run given the container producer, if there is one.
    pub fn context_for(&self, producer: Option<&str>) -> SignalContext {
        SignalContext {
            is_compressed_producer: producer.is_some_and(|p| self.config.is_compressed_producer(p)),
        }
    }

    pub fn analyze(&self, image: &DynamicImage, ctx: &SignalContext) -> PageSignal {
        let plane = GrayPlane::from_image(image);

        let blur_score = or_neutral(
            "blur",
            gradient::laplacian_variance(&plane),
            self.config.blur_threshold,
        );
        let ela_score = or_neutral(
            "ela",
            ela::error_level(image, ctx.is_compressed_producer, &self.config),
            0.0,
        );
        let luminance_std = or_neutral("luminance", gradient::gradient_magnitude_std(&plane), 0.0);
        let noise_score = or_neutral("noise", noise::noise_outlier_score(&plane, &self.config), 0.0);
        let clones_detected = or_neutral("clones", clones::count_clones(&plane, &self.config), 0);
        let classifier_score = self
            .classifier
            .as_deref()
            .and_then(|classifier| classifier::probability(classifier, image));

        let page = PageSignal {
            is_blurry: blur_score < self.config.blur_threshold,
            blur_score,
            ela_score,
            luminance_anomaly: luminance_std > self.config.luminance_std_threshold,
            clones_detected,
            noise_score,
            classifier_score,
        };
        log_debug!(
            "page {}×{}: ela {:.2}, blur {:.1}, noise {:.2}, clones {}",
            image.width(),
            image.height(),
            page.ela_score,
            page.blur_score,
            page.noise_score,
            page.clones_detected
        );
        page
    }
}

pub fn raise_evidence(findings: &SignalFindings, config: &SignalConfig, evidence: &mut Evidence) {
    if findings.ela_score > config.ela_evidence_threshold {
        evidence.raise(codes::ELA_TAMPER_DETECTED);
    }
    if findings.clones_detected > 0 {
        evidence.raise(codes::CLONE_DETECTED);
    }
    if findings.noise_score > 0.0 {
        evidence.raise(codes::NOISE_INCONSISTENCY);
    }
    if findings.luminance_anomaly {
        evidence.raise(codes::LUMINANCE_ANOMALY);
    }
    if findings.is_blurry {
        evidence.raise(codes::IMAGE_BLURRY);
    }
    if findings
        .classifier_score
        .is_some_and(|p| p >= config.classifier_threshold)
    {
        evidence.raise(codes::CLASSIFIER_FORGERY_SUSPECTED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use image::{Rgb, RgbImage};

    struct AlwaysForged;

    impl ForgeryClassifier for AlwaysForged {
        fn name(&self) -> &str {
            "always-forged"
        }

        fn score(&self, _image: &DynamicImage) -> Result<f32> {
            Ok(0.9)
        }
    }

    fn text_like_page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, y| {
            if y % 8 < 2 && x % 5 != 0 {
                Rgb([20, 20, 20])
            } else {
                Rgb([250, 250, 250])
            }
        }))
    }

    #[test]
    fn blank_page_is_blurry_and_otherwise_clean() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 255, 255])));
        let signal = SignalForensicEngine::default().analyze(&page, &SignalContext::default());
        assert!(signal.is_blurry);
        assert_eq!(signal.clones_detected, 0);
        assert_eq!(signal.noise_score, 0.0);
        assert!(!signal.luminance_anomaly);
        assert_eq!(signal.classifier_score, None);
    }

    #[test]
    fn tiny_raster_degrades_to_neutral_values() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let engine = SignalForensicEngine::default();
        let signal = engine.analyze(&page, &SignalContext::default());
        assert!(!signal.is_blurry);
        assert_eq!(signal.blur_score, engine.config().blur_threshold);
        assert!(!signal.luminance_anomaly);
    }

    #[test]
    fn classifier_score_is_attached() {
        let engine = SignalForensicEngine::default().with_classifier(Arc::new(AlwaysForged));
        let signal = engine.analyze(&text_like_page(), &SignalContext::default());
        assert_eq!(signal.classifier_score, Some(f64::from(0.9f32)));

        let mut findings = SignalFindings::default();
        findings.merge_page(&signal);
        let mut evidence = Evidence::new();
        raise_evidence(&findings, engine.config(), &mut evidence);
        assert!(evidence.contains(codes::CLASSIFIER_FORGERY_SUSPECTED));
    }

    #[test]
    fn context_follows_producer() {
        let engine = SignalForensicEngine::default();
        assert!(engine.context_for(Some("iLovePDF")).is_compressed_producer);
        assert!(!engine.context_for(Some("Word")).is_compressed_producer);
        assert!(!engine.context_for(None).is_compressed_producer);
    }
}
