//! Pluggable probabilistic forgery classifier.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use image::DynamicImage;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::signal";

use crate::{log_info, log_warn};

/// Anything that can map a page raster to a forgery probability in `[0, 1]`.
pub trait ForgeryClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, image: &DynamicImage) -> Result<f32>;
}

static SHARED: OnceLock<Option<Arc<dyn ForgeryClassifier>>> = OnceLock::new();

/// Process-wide classifier, loaded on first use. `load` runs at most once;
/// later calls return whatever the first load produced.
pub fn shared_classifier<F>(load: F) -> Option<Arc<dyn ForgeryClassifier>>
where
    F: FnOnce() -> Result<Arc<dyn ForgeryClassifier>>,
{
    SHARED
        .get_or_init(|| match load() {
            Ok(classifier) => {
                log_info!("forgery classifier '{}' loaded", classifier.name());
                Some(classifier)
            }
            Err(err) => {
                log_warn!("forgery classifier unavailable: {err:#}");
                None
            }
        })
        .clone()
}

/// Probability from `classifier`, or `None` when it fails or answers
/// outside `[0, 1]`.
pub fn probability(classifier: &dyn ForgeryClassifier, image: &DynamicImage) -> Option<f64> {
    match classifier.score(image) {
        Ok(p) if p.is_finite() && (0.0..=1.0).contains(&p) => Some(f64::from(p)),
        Ok(p) => {
            log_warn!("classifier '{}' returned out-of-range score {p}", classifier.name());
            None
        }
        Err(err) => {
            log_warn!("classifier '{}' failed: {err:#}", classifier.name());
            None
        }
    }
}
