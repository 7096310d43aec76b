//! Business-logic axis: what the text says, and whether it adds up.

pub mod entities;
pub mod identifiers;
pub mod invoice;
pub mod payslip;
pub mod quality;
pub mod tax;
pub mod temporal;

use chrono::NaiveDateTime;

use crate::models::{codes, BusinessFindings, DocumentType, Evidence};
use crate::utils::fold_upper;

use self::identifiers::{compact_nir, find_nirs, scan_ibans, validate_nir};
use self::payslip::SalaryVerdict;
use self::tax::TaxNoticeEngine;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::logic";

use crate::{log_debug, log_info};

pub const INVALID_TAX_NOTICE_STRUCTURE: &str = "INVALID_TAX_NOTICE_STRUCTURE";
pub const INCONSISTENT_YEAR_RANGE: &str = "INCONSISTENT_YEAR_RANGE";

/// What the engine knows about the document beyond its text.
#[derive(Debug, Clone, Default)]
pub struct LogicContext {
    /// Container creation timestamp, when the structure axis found one.
    pub creation_date: Option<NaiveDateTime>,
    /// Run the tax-notice checks even if the text does not classify as one.
    pub tax_notice_hint: bool,
}

/// Parse a French or English formatted amount: `1 234,56`, `1234.56`,
/// `1.234,56`.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    let normalized = if compact.contains(',') {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };
    normalized.parse().ok()
}

pub fn detect_document_type(text: &str) -> DocumentType {
    let folded = fold_upper(text);
    let has = |needle: &str| folded.contains(needle);
    if has("BULLETIN DE PAIE") || has("SALAIRE") {
        DocumentType::Payslip
    } else if has("AVIS D'IMPOT") || has("REVENUS") {
        DocumentType::TaxNotice
    } else if has("FACTURE") || has("INVOICE") {
        DocumentType::Invoice
    } else if has("CARTE NATIONALE D'IDENTITE") || has("PASSEPORT") {
        DocumentType::IdCard
    } else {
        DocumentType::Unknown
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BusinessLogicEngine {
    tax: TaxNoticeEngine,
}

impl BusinessLogicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, text: &str, context: &LogicContext) -> BusinessFindings {
        let document_type = detect_document_type(text);
        let mut findings = BusinessFindings {
            document_type,
            entities: entities::extract_entities(text),
            ibans: scan_ibans(text),
            ..BusinessFindings::default()
        };

        if findings.ibans.iter().any(|check| !check.valid) {
            findings.invalid_identifier = true;
            findings.business_warnings.push(codes::INVALID_IBAN.to_string());
        }

        if let Some(created_at) = context.creation_date {
            if temporal::has_time_paradox(text, created_at) {
                findings.date_inconsistency = true;
                findings
                    .business_warnings
                    .push(codes::TIME_PARADOX_DETECTED.to_string());
            }
        }

        if let Some(totals) = invoice::extract_totals(text) {
            if totals.is_consistent() {
                findings
                    .math_consistency
                    .push(format!("INVOICE_TOTAL_CONSISTENT ({})", totals.describe()));
            } else {
                findings.amount_inconsistency = true;
                findings.math_consistency.push(format!(
                    "{} ({})",
                    codes::INVOICE_TOTAL_MISMATCH,
                    totals.describe()
                ));
            }
        }

        match document_type {
            DocumentType::Payslip => self.check_payslip(text, &mut findings),
            DocumentType::TaxNotice => self.check_tax_notice(text, &mut findings),
            _ if context.tax_notice_hint => self.check_tax_notice(text, &mut findings),
            _ => {}
        }

        let quality = quality::check_text_quality(text);
        findings.text_quality_issue = quality.has_issue();
        findings.business_warnings.extend(quality.warnings());

        log_info!(
            "business logic: type {:?}, {} IBAN(s), {} warning(s)",
            findings.document_type,
            findings.ibans.len(),
            findings.business_warnings.len()
        );
        findings
    }

    fn check_payslip(&self, text: &str, findings: &mut BusinessFindings) {
        for nir in find_nirs(text) {
            if !validate_nir(nir) {
                log_debug!("NIR candidate failed its key check");
                findings.invalid_identifier = true;
                findings.business_warnings.push(format!(
                    "{}_{}",
                    codes::INVALID_SOCIAL_SECURITY_NUMBER,
                    compact_nir(nir)
                ));
            }
        }

        if let Some(salary) = payslip::check_salary(text) {
            findings.net_salary = Some(salary.net);
            findings.gross_salary = Some(salary.gross);
            match salary.verdict {
                SalaryVerdict::Coherent => {}
                SalaryVerdict::NetAboveGross => findings.amount_inconsistency = true,
                SalaryVerdict::NetRatioHigh | SalaryVerdict::NetRatioLow => {
                    findings.suspicious_amount = true
                }
            }
            findings.business_warnings.extend(salary.warning());
        }
    }

    fn check_tax_notice(&self, text: &str, findings: &mut BusinessFindings) {
        let analysis = self.tax.analyze(text);
        findings.amount_inconsistency |= analysis.impossible_amount;
        findings.suspicious_amount |= analysis.high_rate;
        findings.business_warnings.extend(analysis.anomalies);
        if !analysis.figures.valid_structure {
            findings
                .business_warnings
                .push(INVALID_TAX_NOTICE_STRUCTURE.to_string());
        }
        findings.tax = Some(analysis.figures);
    }
}

/// Map a warning line to the evidence code it stands for. Warnings that only
/// describe missing context have none.
fn evidence_code(warning: &str) -> Option<String> {
    let code = warning.split(" (").next().unwrap_or(warning);
    let mapped = match code {
        "IMPOSSIBLE_NET_SALARY_HIGHER_THAN_GROSS"
        | "SUSPICIOUS_HIGH_NET_SALARY"
        | "SUSPICIOUS_LOW_NET_SALARY" => codes::LOGIC_NET_GROSS_MISMATCH,
        "IMPOSSIBLE_TAX_HIGHER_THAN_INCOME" | "SUSPICIOUS_HIGH_TAX_RATE" => {
            codes::LOGIC_TAX_INCONSISTENCY
        }
        "MISSING_OFFICIAL_HEADER_KEYWORDS" | quality::DOCUMENT_CONTENT_TOO_SPARSE => return None,
        code if code.starts_with(codes::INVALID_SOCIAL_SECURITY_NUMBER) => {
            codes::INVALID_SOCIAL_SECURITY_NUMBER
        }
        code if code.starts_with("INVOICE_TOTAL_CONSISTENT") => return None,
        other => return Some(other.to_string()),
    };
    Some(mapped.to_string())
}

pub fn raise_evidence(findings: &BusinessFindings, evidence: &mut Evidence) {
    findings
        .business_warnings
        .iter()
        .chain(&findings.math_consistency)
        .filter_map(|warning| evidence_code(warning))
        .for_each(|code| {
            evidence.raise(code);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn context_created(y: i32, m: u32, d: u32) -> LogicContext {
        LogicContext {
            creation_date: NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(9, 0, 0)),
            tax_notice_hint: false,
        }
    }

    #[test]
    fn parses_amount_formats() {
        assert_eq!(parse_amount("1 234,56"), Some(1234.56));
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("12\u{a0}000"), Some(12000.0));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn classifies_by_keywords() {
        assert_eq!(detect_document_type("Bulletin de paie - mars"), DocumentType::Payslip);
        assert_eq!(detect_document_type("AVIS D'IMPÔT 2024"), DocumentType::TaxNotice);
        assert_eq!(detect_document_type("Facture n°12"), DocumentType::Invoice);
        assert_eq!(detect_document_type("Passeport"), DocumentType::IdCard);
        assert_eq!(detect_document_type("Lettre"), DocumentType::Unknown);
    }

    #[test]
    fn payslip_with_altered_net_is_inconsistent() {
        let text = "BULLETIN DE PAIE\nSALAIRE BRUT 2 000,00\nNET A PAYER 2 600,00\n";
        let findings = BusinessLogicEngine::new().analyze(text, &LogicContext::default());
        assert_eq!(findings.document_type, DocumentType::Payslip);
        assert!(findings.amount_inconsistency);
        assert_eq!(findings.net_salary, Some(2600.0));
        assert_eq!(findings.gross_salary, Some(2000.0));

        let mut evidence = Evidence::new();
        raise_evidence(&findings, &mut evidence);
        assert!(evidence.contains(codes::LOGIC_NET_GROSS_MISMATCH));
    }

    #[test]
    fn invalid_nir_and_iban_mark_identifier() {
        let text = "Bulletin de paie\nN° SS 1 80 05 92 123 456 52\nIBAN FR76 3000 6000 0112 3456 7890 188\n";
        let findings = BusinessLogicEngine::new().analyze(text, &LogicContext::default());
        assert!(findings.invalid_identifier);

        let mut evidence = Evidence::new();
        raise_evidence(&findings, &mut evidence);
        assert!(evidence.contains(codes::INVALID_IBAN));
        assert!(evidence.contains(codes::INVALID_SOCIAL_SECURITY_NUMBER));
    }

    #[test]
    fn future_date_sets_date_inconsistency() {
        let findings = BusinessLogicEngine::new()
            .analyze("Attestation signee le 20/06/2024", &context_created(2024, 1, 2));
        assert!(findings.date_inconsistency);

        let mut evidence = Evidence::new();
        raise_evidence(&findings, &mut evidence);
        assert!(evidence.contains(codes::TIME_PARADOX_DETECTED));
        assert!(!evidence.contains(quality::DOCUMENT_CONTENT_TOO_SPARSE));
    }

    #[test]
    fn invoice_mismatch_is_an_amount_inconsistency() {
        let findings = BusinessLogicEngine::new().analyze(
            "FACTURE\nTOTAL HT 500.00\nTOTAL TVA 100.00\nTOTAL TTC 900.00",
            &LogicContext::default(),
        );
        assert!(findings.amount_inconsistency);

        let mut evidence = Evidence::new();
        raise_evidence(&findings, &mut evidence);
        assert!(evidence.contains(codes::INVOICE_TOTAL_MISMATCH));
    }

    #[test]
    fn tax_hint_runs_notice_checks() {
        let context = LogicContext {
            tax_notice_hint: true,
            ..LogicContext::default()
        };
        let findings = BusinessLogicEngine::new()
            .analyze("Document administratif: impot net 900, Revenu brut global 800", &context);
        let tax = findings.tax.expect("tax checks ran");
        assert!(!tax.valid_structure);
        assert!(findings.amount_inconsistency);
        assert!(findings
            .business_warnings
            .contains(&INVALID_TAX_NOTICE_STRUCTURE.to_string()));
    }
}
