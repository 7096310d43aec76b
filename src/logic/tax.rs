//! Consistency checks specific to French income-tax notices.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::{parse_amount, INCONSISTENT_YEAR_RANGE};
use crate::models::TaxFigures;
use crate::utils::fold_upper;

const OFFICIAL_HEADERS: [&str; 3] = [
    "DIRECTION GENERALE DES FINANCES PUBLIQUES",
    "AVIS D'IMPOT",
    "REVENU FISCAL DE REFERENCE",
];
const MIN_HEADERS: usize = 2;

const INCOME_LABELS: [&str; 2] = ["REVENU FISCAL DE REFERENCE", "REVENU BRUT GLOBAL"];
const TAX_LABELS: [&str; 3] = ["MONTANT DE L'IMPOT", "TOTAL DE L'IMPOT", "IMPOT NET"];

const MAX_TAX_RATE: f64 = 0.45;
const MAX_YEAR_SPREAD: i32 = 2;

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b20\d{2}\b").expect("year regex is valid"));

fn labelled_amount_patterns(labels: &[&str]) -> Vec<Regex> {
    labels
        .iter()
        .map(|label| {
            RegexBuilder::new(&format!(
                r"{}.*?(\d[\d \x{{a0}}\x{{202f}}]*[.,]\d{{2}}|\d[\d \x{{a0}}\x{{202f}}]*)",
                regex::escape(label)
            ))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .expect("tax amount pattern is valid")
        })
        .collect()
}

static INCOME_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| labelled_amount_patterns(&INCOME_LABELS));
static TAX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| labelled_amount_patterns(&TAX_LABELS));

/// Outcome of the tax-notice checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxAnalysis {
    pub figures: TaxFigures,
    pub anomalies: Vec<String>,
    /// Net tax above the reference income.
    pub impossible_amount: bool,
    pub high_rate: bool,
    pub inconsistent_years: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TaxNoticeEngine;

impl TaxNoticeEngine {
    pub fn analyze(&self, text: &str) -> TaxAnalysis {
        let folded = fold_upper(text);
        let mut analysis = TaxAnalysis::default();

        let headers = OFFICIAL_HEADERS
            .iter()
            .filter(|header| folded.contains(*header))
            .count();
        analysis.figures.valid_structure = headers >= MIN_HEADERS;
        if !analysis.figures.valid_structure {
            analysis
                .anomalies
                .push("MISSING_OFFICIAL_HEADER_KEYWORDS".to_string());
        }

        let income = first_labelled_amount(&INCOME_PATTERNS, &folded);
        let tax = first_labelled_amount(&TAX_PATTERNS, &folded);
        analysis.figures.reference_income = income;
        analysis.figures.net_tax = tax;

        if let (Some(income), Some(tax)) = (income, tax) {
            if tax > income {
                analysis.impossible_amount = true;
                analysis.anomalies.push(format!(
                    "IMPOSSIBLE_TAX_HIGHER_THAN_INCOME (Tax: {tax}, Income: {income})"
                ));
            }
            if income > 0.0 && tax / income > MAX_TAX_RATE {
                analysis.high_rate = true;
                analysis.anomalies.push(format!(
                    "SUSPICIOUS_HIGH_TAX_RATE ({:.1}%)",
                    tax / income * 100.0
                ));
            }
        }

        let years: Vec<i32> = YEAR
            .find_iter(&folded)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if let (Some(first), Some(last)) = (years.iter().min(), years.iter().max()) {
            if last - first > MAX_YEAR_SPREAD {
                analysis.inconsistent_years = true;
                analysis
                    .anomalies
                    .push(format!("{INCONSISTENT_YEAR_RANGE} ({first} to {last})"));
            }
        }

        analysis
    }
}

/// Labels are tried in order; the first one followed by a parseable number wins.
fn first_labelled_amount(patterns: &[Regex], text: &str) -> Option<f64> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_amount(m.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTICE: &str = "DIRECTION GÉNÉRALE DES FINANCES PUBLIQUES\n\
        Avis d'impôt 2024 sur les revenus 2023\n\
        Revenu fiscal de référence : 42 000\n\
        Montant de l'impôt : 3 150,00 €\n";

    #[test]
    fn reads_figures_from_a_coherent_notice() {
        let analysis = TaxNoticeEngine.analyze(NOTICE);
        assert!(analysis.figures.valid_structure);
        assert_eq!(analysis.figures.reference_income, Some(42000.0));
        assert_eq!(analysis.figures.net_tax, Some(3150.0));
        assert!(analysis.anomalies.is_empty(), "{:?}", analysis.anomalies);
    }

    #[test]
    fn tax_above_income_is_impossible() {
        let text = NOTICE.replace("3 150,00", "50 000,00");
        let analysis = TaxNoticeEngine.analyze(&text);
        assert!(analysis.impossible_amount);
        assert!(analysis.high_rate);
    }

    #[test]
    fn missing_headers_and_wide_year_spread() {
        let analysis =
            TaxNoticeEngine.analyze("Impot net 1200 pour 2019, regularisation 2024");
        assert!(!analysis.figures.valid_structure);
        assert!(analysis.inconsistent_years);
        assert!(analysis
            .anomalies
            .contains(&"MISSING_OFFICIAL_HEADER_KEYWORDS".to_string()));
    }
}
