//! Keyword and placeholder scan over the extracted text, plus a coarse
//! cleanliness score.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::models::{codes, Evidence, SemanticFindings};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::semantic";

use crate::log_debug;

pub const NO_TEXT_TO_ANALYZE: &str = "NO_TEXT_TO_ANALYZE";
pub const SUSPICIOUS_KEYWORD_FOUND: &str = "SUSPICIOUS_KEYWORD_FOUND";
pub const HIGH_GARBAGE_RATIO: &str = "HIGH_GARBAGE_RATIO";
pub const EXCESSIVE_CAPS: &str = "EXCESSIVE_CAPS";

const MIN_TEXT_CHARS: usize = 10;
const GARBAGE_RATIO_THRESHOLD: f64 = 0.15;
const CAPS_RATIO_THRESHOLD: f64 = 0.8;
const CAPS_PENALTY: f64 = 20.0;

/// Marker words left on specimens, drafts and generator templates.
/// Whole-word entries are bounded, phrases are matched anywhere.
const FORGERY_MARKERS: &[(&str, bool)] = &[
    ("SPECIMEN", true),
    ("SAMPLE", true),
    ("VOID", true),
    ("DRAFT", true),
    ("BROUILLON", true),
    ("FAUX", true),
    ("TEST", true),
    ("TEMPLATE", true),
    ("EXAMPLE", true),
    ("EXEMPLE", true),
    ("FAKE", true),
    ("INVALID DOCUMENT", false),
    ("COPY-PASTE", false),
    ("COLLE-COPIER", false),
    ("NON VALIDE", false),
];

const PLACEHOLDERS: &[&str] = &[
    "[NOM]",
    "[PRENOM]",
    "[ADRESSE]",
    "{{NAME}}",
    "{{SURNAME}}",
    "__NAME__",
    "__SURNAME__",
    "John Doe",
    "Jane Doe",
];

static MARKER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FORGERY_MARKERS
        .iter()
        .map(|&(word, bounded)| {
            let escaped = regex::escape(word);
            let pattern = if bounded {
                format!(r"\b{escaped}\b")
            } else {
                escaped
            };
            let regex = RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .expect("forgery marker pattern is valid");
            (word, regex)
        })
        .collect()
});

static PLACEHOLDER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    PLACEHOLDERS
        .iter()
        .map(|&token| {
            let regex = RegexBuilder::new(&regex::escape(token))
                .case_insensitive(true)
                .build()
                .expect("placeholder pattern is valid");
            (token, regex)
        })
        .collect()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct SemanticEngine;

impl SemanticEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> SemanticFindings {
        if text.chars().count() < MIN_TEXT_CHARS {
            return SemanticFindings {
                quality_score: 0.0,
                linguistic_anomalies: vec![NO_TEXT_TO_ANALYZE.to_string()],
                ..SemanticFindings::default()
            };
        }

        let mut findings = SemanticFindings::default();

        for (word, regex) in MARKER_PATTERNS.iter() {
            if regex.is_match(text) {
                findings.flagged_keywords.push(word.to_string());
            }
        }
        if !findings.flagged_keywords.is_empty() {
            push_unique(&mut findings.linguistic_anomalies, SUSPICIOUS_KEYWORD_FOUND);
        }

        for (token, regex) in PLACEHOLDER_PATTERNS.iter() {
            if regex.is_match(text) {
                findings.found_placeholders.push(token.to_string());
            }
        }
        if !findings.found_placeholders.is_empty() {
            push_unique(&mut findings.linguistic_anomalies, codes::TEMPLATE_PLACEHOLDER_DETECTED);
        }

        let garbage = garbage_ratio(text);
        if garbage > GARBAGE_RATIO_THRESHOLD {
            push_unique(&mut findings.linguistic_anomalies, HIGH_GARBAGE_RATIO);
            findings.quality_score -= garbage * 100.0;
        }

        if caps_ratio(text) > CAPS_RATIO_THRESHOLD {
            push_unique(&mut findings.linguistic_anomalies, EXCESSIVE_CAPS);
            findings.quality_score -= CAPS_PENALTY;
        }

        findings.quality_score = findings.quality_score.max(0.0);
        log_debug!(
            "semantic scan: {} keywords, {} placeholders, quality {:.1}",
            findings.flagged_keywords.len(),
            findings.found_placeholders.len(),
            findings.quality_score
        );
        findings
    }
}

/// Evidence codes for a semantic scan.
pub fn raise_evidence(findings: &SemanticFindings, evidence: &mut Evidence) {
    for word in &findings.flagged_keywords {
        let suffix = word.replace([' ', '-'], "_");
        evidence.raise(format!("{}_{suffix}", codes::SEMANTIC_FORGERY_KEYWORD));
    }
    if !findings.found_placeholders.is_empty() {
        evidence.raise(codes::TEMPLATE_PLACEHOLDER_DETECTED);
    }
}

fn push_unique(list: &mut Vec<String>, code: &str) {
    if !list.iter().any(|existing| existing == code) {
        list.push(code.to_string());
    }
}

/// Share of characters that are neither alphanumeric, whitespace, nor common
/// punctuation found in amounts and dates.
fn garbage_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut garbage = 0usize;
    for c in text.chars() {
        total += 1;
        let benign = c.is_alphanumeric()
            || c.is_whitespace()
            || matches!(c, '.' | ',' | '€' | '$' | '£' | '-' | '/');
        if !benign {
            garbage += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        garbage as f64 / total as f64
    }
}

fn caps_ratio(text: &str) -> f64 {
    let (upper, letters) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(upper, letters), c| {
            (upper + usize::from(c.is_uppercase()), letters + 1)
        });
    if letters == 0 {
        0.0
    } else {
        upper as f64 / letters as f64
    }
}
