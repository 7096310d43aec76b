//! Turns evidence into hypotheses about how a document was forged.
//!
//! Rules are independent and additive: each one tests the evidence and
//! findings of a run and contributes at most one narrative.

use serde::{Deserialize, Serialize};

use crate::models::{codes, AxisFindings, Evidence};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::investigation";

use crate::log_debug;

pub const DOCUMENT_INTACT: &str =
    "Document appears intact. No known forgery method was detected.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigationConfig {
    /// Producer substrings (lowercase) that point to an online or image editor
    pub editing_producers: Vec<String>,
    /// ELA above this reads as visible montage when an editor is involved
    pub montage_ela: f64,
    /// ELA above this reads as heavy pixel retouching on its own
    pub retouch_ela: f64,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        Self {
            editing_producers: ["ilovepdf", "skia", "gimp"]
                .into_iter()
                .map(String::from)
                .collect(),
            montage_ela: 3.0,
            retouch_ela: 4.5,
        }
    }
}

/// Everything a rule may look at.
pub struct Case<'a> {
    pub evidence: &'a Evidence,
    pub findings: &'a AxisFindings,
    pub config: &'a InvestigationConfig,
}

impl Case<'_> {
    fn has(&self, code: &str) -> bool {
        self.evidence.contains(code)
    }

    fn producer(&self) -> &str {
        self.findings.structure.producer().unwrap_or_default()
    }

    fn editing_producer(&self) -> bool {
        let producer = self.producer().to_lowercase();
        self.config
            .editing_producers
            .iter()
            .any(|name| producer.contains(name.as_str()))
    }
}

pub struct Rule {
    pub id: &'static str,
    pub applies: fn(&Case<'_>) -> bool,
    pub narrative: fn(&Case<'_>) -> String,
}

fn fixed(text: &'static str) -> String {
    text.to_string()
}

/// Registry, in report order.
pub static RULES: &[Rule] = &[
    Rule {
        id: "editing_producer",
        applies: |case| case.editing_producer(),
        narrative: |case| {
            let producer = case.producer();
            if case.has(codes::LOGIC_NET_GROSS_MISMATCH) {
                format!(
                    "The document was produced with editing software ({producer}), \
                     probably used to alter the salary figures."
                )
            } else if case.has(codes::ELA_TAMPER_DETECTED)
                || case.findings.forensic.ela_score > case.config.montage_ela
            {
                format!(
                    "The document was produced with editing software ({producer}) \
                     and shows traces of visual montage."
                )
            } else {
                format!(
                    "Light structural modification through {producer}. Most likely a \
                     legitimate conversion (e.g. Word to PDF); no blatant forgery trace."
                )
            }
        },
    },
    Rule {
        id: "pixel_retouching",
        applies: |case| case.findings.forensic.ela_score > case.config.retouch_ela,
        narrative: |_| {
            fixed(
                "Probable forgery by image retouching (Paint/Photoshop style). Pixels \
                 show a strong inconsistency (copy-paste or erasure).",
            )
        },
    },
    Rule {
        id: "net_gross_mismatch",
        applies: |case| case.has(codes::LOGIC_NET_GROSS_MISMATCH),
        narrative: |case| {
            let business = &case.findings.logic.business;
            let net = business.net_salary.unwrap_or_default();
            let gross = business.gross_salary.unwrap_or_default();
            format!(
                "Calculation error: net ({net:.2}) and gross ({gross:.2}) do not match \
                 statutory rates. One amount was probably edited without recomputing \
                 the other."
            )
        },
    },
    Rule {
        id: "figure_mismatch",
        applies: |case| {
            case.has(codes::INVOICE_TOTAL_MISMATCH) || case.has(codes::LOGIC_TAX_INCONSISTENCY)
        },
        narrative: |_| {
            fixed(
                "Totals do not add up: at least one printed amount was changed without \
                 updating the figures derived from it.",
            )
        },
    },
    Rule {
        id: "time_paradox",
        applies: |case| case.has(codes::TIME_PARADOX_DETECTED),
        narrative: |_| {
            fixed(
                "Temporal inconsistency: the document mentions a date after its own \
                 creation. Strong sign of metadata or content manipulation.",
            )
        },
    },
    Rule {
        id: "template_reuse",
        applies: |case| case.has(codes::METADATA_CREATION_DATE_SUSPICIOUS),
        narrative: |_| {
            fixed(
                "Template reuse: the creation date is very old or generic, suggesting a \
                 forged-document template.",
            )
        },
    },
    Rule {
        id: "mrz_checksum",
        applies: |case| case.has(codes::FRAUD_MRZ_CHECKSUM_INVALID),
        narrative: |_| {
            fixed(
                "Identity alteration: the MRZ check digits are invalid. The document was \
                 edited by hand without recomputing its security codes.",
            )
        },
    },
    Rule {
        id: "invalid_identifier",
        applies: |case| {
            case.has(codes::INVALID_IBAN) || case.has(codes::INVALID_SOCIAL_SECURITY_NUMBER)
        },
        narrative: |_| {
            fixed(
                "Invalid identifier: a bank account or social security number fails its \
                 checksum, which typing errors in a genuine document rarely produce.",
            )
        },
    },
    Rule {
        id: "template_placeholders",
        applies: |case| case.has(codes::TEMPLATE_PLACEHOLDER_DETECTED),
        narrative: |_| {
            fixed(
                "Reused document template: fill-in placeholders (e.g. {{NAME}}) remain, \
                 so this is an edited template rather than an original.",
            )
        },
    },
    Rule {
        id: "forgery_keywords",
        applies: |case| case.evidence.any_with_prefix(codes::SEMANTIC_FORGERY_KEYWORD),
        narrative: |_| {
            fixed(
                "Fraudulent mention detected: the text contains words typical of fake \
                 documents (e.g. SPECIMEN, VOID, FAKE), often left behind by mistake.",
            )
        },
    },
    Rule {
        id: "garbled_text",
        applies: |case| case.has(codes::SUSPICIOUS_TEXT_QUALITY_GARBAGE),
        narrative: |_| {
            fixed(
                "Digital text alteration: abnormal character quality suggests masking or \
                 heavy software editing.",
            )
        },
    },
    Rule {
        id: "excessive_caps",
        applies: |case| case.has(codes::SUSPICIOUS_PATTERN_EXCESSIVE_CAPS),
        narrative: |_| {
            fixed(
                "Atypical writing style: excessive capitals are characteristic of \
                 phishing or unofficial templates.",
            )
        },
    },
    Rule {
        id: "font_patchwork",
        applies: |case| case.evidence.any_with_prefix(codes::FONT_OUTLIER),
        narrative: |case| {
            let outliers = &case.findings.structure.font_analysis.suspicious_fonts;
            let fonts: Vec<&str> = outliers.iter().map(|o| o.font.as_str()).collect();
            format!(
                "Text patchwork: a rare font ({}) appears in isolated places such as \
                 amounts or names, the classic sign of local re-typing over the original.",
                fonts.join(", ")
            )
        },
    },
    Rule {
        id: "copy_move",
        applies: |case| case.has(codes::CLONE_DETECTED),
        narrative: |_| {
            fixed(
                "Copy-move alteration: strictly identical regions were found (e.g. the \
                 same signature or stamp reproduced exactly), typical of digital montage.",
            )
        },
    },
    Rule {
        id: "noise_splicing",
        applies: |case| case.has(codes::NOISE_INCONSISTENCY),
        narrative: |_| {
            fixed(
                "Splicing alteration: the image grain is inconsistent, suggesting that an \
                 element from another source (e.g. a signature) was added on top.",
            )
        },
    },
    Rule {
        id: "reused_object",
        applies: |case| {
            case.has(codes::STRUCTURAL_CLONE_DETECTED) || case.has(codes::DUPLICATE_EMBEDDED_IMAGE)
        },
        narrative: |_| {
            fixed(
                "Reused embedded object: the same picture is placed several times in the \
                 file, as when a signature or stamp is pasted in.",
            )
        },
    },
];

#[derive(Debug, Clone, Default)]
pub struct InvestigationEngine {
    config: InvestigationConfig,
}

impl InvestigationEngine {
    pub fn new(config: InvestigationConfig) -> Self {
        Self { config }
    }

    pub fn generate_hypotheses(&self, evidence: &Evidence, findings: &AxisFindings) -> Vec<String> {
        let case = Case {
            evidence,
            findings,
            config: &self.config,
        };
        let mut hypotheses: Vec<String> = RULES
            .iter()
            .filter(|rule| (rule.applies)(&case))
            .inspect(|rule| log_debug!("rule '{}' fired", rule.id))
            .map(|rule| (rule.narrative)(&case))
            .collect();

        if hypotheses.is_empty() && evidence.is_empty() {
            hypotheses.push(DOCUMENT_INTACT.to_string());
        }
        hypotheses
    }
}
