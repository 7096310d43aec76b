use serde::{Deserialize, Serialize};

/// Indicator codes shared by the engines, the scorer and the investigation
/// rules. Engines may also emit parameterized codes built from these prefixes.
pub mod codes {
    // Scoring indicators
    pub const FORENSIC_SIGNAL: &str = "FORENSIC_SIGNAL";
    pub const STRUCTURE_SIGNAL: &str = "STRUCTURE_SIGNAL";
    pub const LOGIC_SIGNAL: &str = "LOGIC_SIGNAL";

    // Signal axis
    pub const ELA_TAMPER_DETECTED: &str = "ELA_TAMPER_DETECTED";
    pub const CLONE_DETECTED: &str = "CLONE_DETECTED";
    pub const NOISE_INCONSISTENCY: &str = "NOISE_INCONSISTENCY";
    pub const LUMINANCE_ANOMALY: &str = "LUMINANCE_ANOMALY";
    pub const IMAGE_BLURRY: &str = "IMAGE_BLURRY";
    pub const CLASSIFIER_FORGERY_SUSPECTED: &str = "CLASSIFIER_FORGERY_SUSPECTED";
    pub const SIGNAL_PAGE_TIMEOUT: &str = "SIGNAL_PAGE_TIMEOUT";

    // Structure axis
    pub const TIMELINE_MODIFIED: &str = "TIMELINE_MODIFIED";
    pub const METADATA_RECENTLY_CREATED: &str = "METADATA_RECENTLY_CREATED";
    pub const METADATA_CREATION_DATE_SUSPICIOUS: &str = "METADATA_CREATION_DATE_SUSPICIOUS";
    pub const METADATA_PRODUCER_MISSING: &str = "METADATA_PRODUCER_MISSING";
    pub const EDITING_SOFTWARE_PRODUCER: &str = "EDITING_SOFTWARE_PRODUCER";
    pub const INCREMENTAL_UPDATES: &str = "INCREMENTAL_UPDATES";
    pub const FONT_OUTLIER: &str = "FONT_OUTLIER";
    pub const STRUCTURAL_CLONE_DETECTED: &str = "STRUCTURAL_CLONE_DETECTED";
    pub const DUPLICATE_EMBEDDED_IMAGE: &str = "DUPLICATE_EMBEDDED_IMAGE";

    // Logic axis
    pub const TIME_PARADOX_DETECTED: &str = "TIME_PARADOX_DETECTED";
    pub const LOGIC_NET_GROSS_MISMATCH: &str = "LOGIC_NET_GROSS_MISMATCH";
    pub const LOGIC_TAX_INCONSISTENCY: &str = "LOGIC_TAX_INCONSISTENCY";
    pub const INVOICE_TOTAL_MISMATCH: &str = "INVOICE_TOTAL_MISMATCH";
    pub const INVALID_IBAN: &str = "INVALID_IBAN";
    pub const INVALID_SOCIAL_SECURITY_NUMBER: &str = "INVALID_SOCIAL_SECURITY_NUMBER";
    pub const FRAUD_MRZ_CHECKSUM_INVALID: &str = "FRAUD_MRZ_CHECKSUM_INVALID";
    pub const SUSPICIOUS_TEXT_QUALITY_GARBAGE: &str = "SUSPICIOUS_TEXT_QUALITY_GARBAGE";
    pub const SUSPICIOUS_PATTERN_EXCESSIVE_CAPS: &str = "SUSPICIOUS_PATTERN_EXCESSIVE_CAPS";
    pub const SUSPICIOUS_EMAIL_DOMAIN: &str = "SUSPICIOUS_EMAIL_DOMAIN";
    pub const TEMPLATE_PLACEHOLDER_DETECTED: &str = "TEMPLATE_PLACEHOLDER_DETECTED";
    /// Prefix; the matched keyword is appended (`SEMANTIC_FORGERY_KEYWORD_SPECIMEN`).
    pub const SEMANTIC_FORGERY_KEYWORD: &str = "SEMANTIC_FORGERY_KEYWORD";

    // Pipeline gaps. Stage names are appended (`ENGINE_FAILED_STRUCTURE`).
    pub const EXTRACTION_FAILED: &str = "EXTRACTION_FAILED";
    pub const ENGINE_FAILED: &str = "ENGINE_FAILED";
}

/// Append-only, ordered set of indicator codes raised during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidence {
    codes: Vec<String>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a code. Returns false if it was already present.
    pub fn raise(&mut self, code: impl Into<String>) -> bool {
        let code = code.into();
        if self.contains(&code) {
            return false;
        }
        self.codes.push(code);
        true
    }

    pub fn raise_all<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for code in codes {
            self.raise(code);
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|existing| existing == code)
    }

    /// True if any raised code starts with `prefix`.
    pub fn any_with_prefix(&self, prefix: &str) -> bool {
        self.codes.iter().any(|existing| existing.starts_with(prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.codes
    }
}

impl<S: Into<String>> FromIterator<S> for Evidence {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut evidence = Evidence::new();
        evidence.raise_all(iter);
        evidence
    }
}

/// `ENGINE_FAILED_<STAGE>` style code.
pub fn stage_code(prefix: &str, stage: &str) -> String {
    format!("{prefix}_{}", stage.to_ascii_uppercase())
}
