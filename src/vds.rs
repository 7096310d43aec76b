//! Tiered certification: `UNCERTIFIED(0) → CHECK(1) → FORENSIC(2) →
//! CERTIFIED(3)`. Gates are evaluated strictly in order and a failed gate
//! stops the climb. Reads the same findings as scoring but applies its own
//! pass/fail semantics, so the two can disagree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{AxisFindings, VdsResult};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::vds";

use crate::log_debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VdsConfig {
    /// Level 1: minimum content-quality proxy
    pub min_content_quality: f64,
    /// Producer substrings (lowercase) that fail level 1
    pub suspicious_tools: Vec<String>,
    /// Texts shorter than this get the low quality proxy
    pub min_text_chars: usize,
    pub short_text_quality: f64,
    pub max_content_quality: f64,

    /// Level 2: ELA divergence must stay strictly below this
    pub max_ela: f64,
}

impl Default for VdsConfig {
    fn default() -> Self {
        Self {
            min_content_quality: 0.70,
            suspicious_tools: ["photoshop", "gimp", "paint", "phantompdf", "editor"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_text_chars: 50,
            short_text_quality: 0.4,
            max_content_quality: 0.95,
            max_ela: 15.0,
        }
    }
}

/// The signals the gates consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VdsInput {
    pub content_quality: f64,
    pub metadata_suspect: bool,
    pub ela_score: f64,
    /// No reused embedded object, no copy-move clone, no duplicate picture.
    pub signature_integrity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VdsLevel {
    Uncertified = 0,
    Check = 1,
    Forensic = 2,
    Certified = 3,
}

impl VdsLevel {
    pub fn badges(&self) -> &'static [&'static str] {
        match self {
            VdsLevel::Uncertified => &[],
            VdsLevel::Check => &["VDS-Check", "Bronze"],
            VdsLevel::Forensic => &["VDS-Check", "VDS-Forensic", "Silver"],
            VdsLevel::Certified => &["VDS-Check", "VDS-Forensic", "VDS-Certified", "Gold"],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VdsValidator {
    config: VdsConfig,
}

impl VdsValidator {
    pub fn new(config: VdsConfig) -> Self {
        Self { config }
    }

    /// Derive gate inputs from a run's findings. `text_chars` is the length
    /// of the analyzed text.
    pub fn input_from(&self, findings: &AxisFindings, text_chars: usize) -> VdsInput {
        let content_quality = if text_chars > self.config.min_text_chars {
            (findings.logic.semantic.quality_score / 100.0).min(self.config.max_content_quality)
        } else {
            self.config.short_text_quality
        };
        let producer = findings
            .structure
            .producer()
            .unwrap_or_default()
            .to_lowercase();
        let metadata_suspect = self
            .config
            .suspicious_tools
            .iter()
            .any(|tool| producer.contains(tool.as_str()));
        let structure = &findings.structure;
        let signature_integrity = structure.structural_clones.is_empty()
            && structure.duplicate_images.is_empty()
            && findings.forensic.clones_detected == 0;

        VdsInput {
            content_quality,
            metadata_suspect,
            ela_score: findings.forensic.ela_score,
            signature_integrity,
        }
    }

    pub fn validate(&self, input: &VdsInput) -> VdsResult {
        let mut details = BTreeMap::new();

        let quality_ok = input.content_quality >= self.config.min_content_quality;
        details.insert("ocr_consistency".to_string(), quality_ok);
        details.insert("metadata_safe".to_string(), !input.metadata_suspect);
        if !quality_ok || input.metadata_suspect {
            let mut reasons = Vec::new();
            if !quality_ok {
                reasons.push("content quality below certification threshold");
            }
            if input.metadata_suspect {
                reasons.push("editing software found in metadata");
            }
            return self.stop(VdsLevel::Uncertified, details, reasons.join(", "));
        }

        let ela_ok = input.ela_score < self.config.max_ela;
        details.insert("ela_compliance".to_string(), ela_ok);
        if !ela_ok {
            return self.stop(
                VdsLevel::Check,
                details,
                format!("ELA divergence detected (score {:.2})", input.ela_score),
            );
        }

        details.insert("signature_integrity".to_string(), input.signature_integrity);
        if !input.signature_integrity {
            return self.stop(
                VdsLevel::Forensic,
                details,
                "reused or cloned embedded object".to_string(),
            );
        }

        log_debug!("certified at level {}", VdsLevel::Certified as u8);
        VdsResult {
            level_achieved: VdsLevel::Certified as u8,
            badges: badges(VdsLevel::Certified),
            details,
            failure_reason: None,
        }
    }

    fn stop(&self, level: VdsLevel, details: BTreeMap<String, bool>, reason: String) -> VdsResult {
        log_debug!("stopped at level {}: {}", level as u8, reason);
        VdsResult {
            level_achieved: level as u8,
            badges: badges(level),
            details,
            failure_reason: Some(reason),
        }
    }
}

fn badges(level: VdsLevel) -> Vec<String> {
    level.badges().iter().map(|b| b.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructuralClone;

    fn clean() -> VdsInput {
        VdsInput {
            content_quality: 0.9,
            metadata_suspect: false,
            ela_score: 2.0,
            signature_integrity: true,
        }
    }

    #[test]
    fn clean_input_is_certified() {
        let result = VdsValidator::default().validate(&clean());
        assert_eq!(result.level_achieved, 3);
        assert_eq!(result.badges.last().map(String::as_str), Some("Gold"));
        assert_eq!(result.failure_reason, None);
        assert_eq!(result.details.len(), 4);
    }

    #[test]
    fn editing_tool_stops_at_level_zero_without_badges() {
        let result = VdsValidator::default().validate(&VdsInput {
            metadata_suspect: true,
            ..clean()
        });
        assert_eq!(result.level_achieved, 0);
        assert!(result.badges.is_empty());
        assert_eq!(result.details.get("metadata_safe"), Some(&false));
        assert!(!result.details.contains_key("ela_compliance"));
    }

    #[test]
    fn ela_divergence_stops_at_bronze() {
        let result = VdsValidator::default().validate(&VdsInput {
            ela_score: 15.0,
            ..clean()
        });
        assert_eq!(result.level_achieved, 1);
        assert_eq!(result.badges, vec!["VDS-Check".to_string(), "Bronze".to_string()]);
    }

    #[test]
    fn cloned_object_stops_at_silver() {
        let result = VdsValidator::default().validate(&VdsInput {
            signature_integrity: false,
            ..clean()
        });
        assert_eq!(result.level_achieved, 2);
        assert_eq!(result.badges.last().map(String::as_str), Some("Silver"));
    }

    #[test]
    fn short_text_cannot_pass_level_one() {
        let validator = VdsValidator::default();
        let input = validator.input_from(&AxisFindings::default(), 12);
        assert_eq!(input.content_quality, 0.4);
        assert_eq!(validator.validate(&input).level_achieved, 0);
    }

    #[test]
    fn structural_clone_breaks_signature_integrity() {
        let mut findings = AxisFindings::default();
        findings.structure.structural_clones.push(StructuralClone {
            page: 1,
            object_id: "4 0 R".into(),
            count: 2,
            usage_names: vec!["Im0".into()],
        });
        let input = VdsValidator::default().input_from(&findings, 400);
        assert_eq!(input.content_quality, 0.95);
        assert!(!input.signature_integrity);
    }
}
