use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Forensic (signal) axis
// ============================================================================

/// Signal analysis of a single page raster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSignal {
    pub is_blurry: bool,
    /// Laplacian variance. Lower is blurrier.
    pub blur_score: f64,
    pub ela_score: f64,
    pub luminance_anomaly: bool,
    pub clones_detected: u32,
    pub noise_score: f64,
    /// Probability from the optional classifier, `None` when unavailable.
    pub classifier_score: Option<f64>,
}

/// Worst-case merge of every analyzed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalFindings {
    pub is_blurry: bool,
    /// Lowest Laplacian variance across pages, `None` before any page merged.
    pub blur_score: Option<f64>,
    pub ela_score: f64,
    pub luminance_anomaly: bool,
    pub clones_detected: u32,
    pub noise_score: f64,
    pub classifier_score: Option<f64>,
    /// Small embedded rasters pulled from a PDF, typical of pasted patches.
    pub patch_count: u32,
    pub pages_analyzed: usize,
}

impl SignalFindings {
    /// Fold one page in, keeping the worst value of every sub-signal.
    pub fn merge_page(&mut self, page: &PageSignal) {
        self.is_blurry |= page.is_blurry;
        self.blur_score = Some(match self.blur_score {
            Some(current) => current.min(page.blur_score),
            None => page.blur_score,
        });
        self.ela_score = self.ela_score.max(page.ela_score);
        self.luminance_anomaly |= page.luminance_anomaly;
        self.clones_detected = self.clones_detected.max(page.clones_detected);
        self.noise_score = self.noise_score.max(page.noise_score);
        self.classifier_score = match (self.classifier_score, page.classifier_score) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.pages_analyzed += 1;
    }
}

// ============================================================================
// Structure axis
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataTimeline {
    /// Raw `CreationDate` string as stored in the container.
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    /// `None` when the input has no container (plain image). Empty when the
    /// container exists but declares no producer.
    pub producer: Option<String>,
    /// Creation date parsed to minute precision, timezone ignored.
    pub created_at: Option<NaiveDateTime>,
    /// Known editing tool the producer string matched, if any.
    pub editing_tool: Option<String>,
    pub issues: Vec<String>,
}

/// One embedded image object painted or named more than once on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralClone {
    pub page: u32,
    pub object_id: String,
    pub count: u32,
    pub usage_names: Vec<String>,
}

/// Distinct embedded objects that carry the same picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateImage {
    pub first_object: String,
    pub second_object: String,
    pub hamming_distance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontUsage {
    pub name: String,
    pub characters: u32,
    /// Share of all attributed characters, in percent.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontOutlier {
    pub font: String,
    pub characters: u32,
    pub share: f64,
    pub dominant_font: String,
    pub sample: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontAnalysis {
    pub fonts_found: Vec<FontUsage>,
    pub suspicious_fonts: Vec<FontOutlier>,
    pub total_analyzed_chars: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalUpdates {
    pub has_incremental_updates: bool,
    pub revision_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureFindings {
    pub metadata: MetadataTimeline,
    pub structural_clones: Vec<StructuralClone>,
    pub duplicate_images: Vec<DuplicateImage>,
    pub font_analysis: FontAnalysis,
    pub incremental_updates: IncrementalUpdates,
}

impl StructureFindings {
    /// Findings for inputs that have no container to inspect.
    pub fn without_container() -> Self {
        Self::default()
    }

    pub fn producer(&self) -> Option<&str> {
        self.metadata.producer.as_deref()
    }
}

// ============================================================================
// Logic axis
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Payslip,
    TaxNotice,
    Invoice,
    IdCard,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// National identifier digits (NIR-like).
    pub ssn: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbanCheck {
    pub iban: String,
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxFigures {
    pub valid_structure: bool,
    /// Reference taxable income.
    pub reference_income: Option<f64>,
    pub net_tax: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessFindings {
    pub document_type: DocumentType,
    pub entities: ExtractedEntities,
    pub ibans: Vec<IbanCheck>,
    pub math_consistency: Vec<String>,
    pub business_warnings: Vec<String>,
    pub net_salary: Option<f64>,
    pub gross_salary: Option<f64>,
    pub tax: Option<TaxFigures>,
    /// A date in the text postdates the container creation.
    pub date_inconsistency: bool,
    /// Figures that cannot both be true (net above gross, tax above income).
    pub amount_inconsistency: bool,
    /// Figures that are possible but outside usual ratios.
    pub suspicious_amount: bool,
    pub invalid_identifier: bool,
    pub text_quality_issue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticFindings {
    pub flagged_keywords: Vec<String>,
    pub found_placeholders: Vec<String>,
    pub quality_score: f64,
    pub linguistic_anomalies: Vec<String>,
}

impl Default for SemanticFindings {
    fn default() -> Self {
        Self {
            flagged_keywords: Vec::new(),
            found_placeholders: Vec::new(),
            quality_score: 100.0,
            linguistic_anomalies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MrzFormat {
    /// Passport, 2 × 44.
    Td3,
    /// 2 × 36.
    Td2,
    /// ID card, 3 × 30.
    Td1,
}

impl MrzFormat {
    pub fn label(&self) -> &'static str {
        match self {
            MrzFormat::Td3 => "TD3 (Passport)",
            MrzFormat::Td2 => "TD2",
            MrzFormat::Td1 => "TD1 (ID Card)",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrzData {
    pub document_number: String,
    pub birth_date: String,
    pub expiry_date: String,
    /// Per-field check results, in document number / birth / expiry order.
    pub field_checks: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrzFindings {
    pub found: bool,
    pub format: Option<MrzFormat>,
    pub valid_checksums: bool,
    pub data: Option<MrzData>,
    pub raw_lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicFindings {
    pub business: BusinessFindings,
    pub semantic: SemanticFindings,
    pub mrz: MrzFindings,
}

impl LogicFindings {
    pub fn date_inconsistency(&self) -> bool {
        self.business.date_inconsistency
    }

    pub fn amount_inconsistency(&self) -> bool {
        self.business.amount_inconsistency
    }

    /// IBAN, NIR or MRZ checksum failure.
    pub fn invalid_identifier(&self) -> bool {
        self.business.invalid_identifier || (self.mrz.found && !self.mrz.valid_checksums)
    }

    /// Forgery markers or unfilled template placeholders.
    pub fn template_markers(&self) -> bool {
        !self.semantic.flagged_keywords.is_empty() || !self.semantic.found_placeholders.is_empty()
    }
}

/// Raw findings of all three axes for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisFindings {
    pub forensic: SignalFindings,
    pub structure: StructureFindings,
    pub logic: LogicFindings,
}
