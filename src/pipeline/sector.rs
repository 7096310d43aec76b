//! Keyword-based guess of what kind of document this is, used when the
//! caller did not declare a specific sector.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Sector;
use crate::utils::fold_upper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedSector {
    Utilities,
    Employment,
    Banking,
    Government,
    Identity,
    Education,
    Generic,
}

/// Checked in order; the first family with a hit wins.
const KEYWORDS: &[(DetectedSector, &[&str])] = &[
    (
        DetectedSector::Utilities,
        &["FACTURE", "BILL", "ELECTRICITE", "ORANGE", "FREE", "INTERNET", "ECHEANCE"],
    ),
    (
        DetectedSector::Employment,
        &["BULLETIN DE PAIE", "SALAIRE", "FICHE DE PAIE", "EMPLOYEUR", "PAYSLIP"],
    ),
    (
        DetectedSector::Banking,
        &["RELEVE D'IDENTITE BANCAIRE", "RIB", "IBAN", "BIC", "COMPTE BANCAIRE"],
    ),
    (
        DetectedSector::Government,
        &[
            "IMPOT",
            "FISCAL",
            "REVENU",
            "DECLARATION",
            "TAX RETURN",
            "DIRECTION GENERALE DES FINANCES PUBLIQUES",
            "RFR",
        ],
    ),
    (
        DetectedSector::Identity,
        &["PASSEPORT", "CARTE NATIONALE D'IDENTITE", "DRIVING LICENSE", "PERMIS DE CONDUIRE"],
    ),
    (
        DetectedSector::Education,
        &[
            "UNIVERSITE",
            "UNIVERSITY",
            "DIPLOME",
            "DIPLOMA",
            "CERTIFICAT",
            "CERTIFICATE",
            "ADMISSION",
            "ATTESTATION",
            "ECOLE",
            "SCHOOL",
        ],
    ),
];

/// One whole-word alternation per family, so "RIB" does not fire inside
/// "ATTRIBUTION".
static MATCHERS: LazyLock<Vec<(DetectedSector, Regex)>> = LazyLock::new(|| {
    KEYWORDS
        .iter()
        .map(|(sector, words)| {
            let alternation = words
                .iter()
                .map(|word| regex::escape(word))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b(?:{alternation})\b");
            (
                *sector,
                Regex::new(&pattern).expect("sector keyword regex is valid"),
            )
        })
        .collect()
});

impl DetectedSector {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedSector::Utilities => "utilities",
            DetectedSector::Employment => "employment",
            DetectedSector::Banking => "banking",
            DetectedSector::Government => "government",
            DetectedSector::Identity => "identity",
            DetectedSector::Education => "education",
            DetectedSector::Generic => "generic",
        }
    }

    /// Scoring policy that fits the detected family.
    pub fn scoring_sector(&self) -> Sector {
        match self {
            DetectedSector::Utilities => Sector::Immobilier,
            DetectedSector::Employment => Sector::Rh,
            DetectedSector::Banking => Sector::Banque,
            DetectedSector::Government
            | DetectedSector::Identity
            | DetectedSector::Education
            | DetectedSector::Generic => Sector::Generic,
        }
    }
}

pub fn detect_sector(text: &str) -> DetectedSector {
    let folded = fold_upper(text);
    MATCHERS
        .iter()
        .find(|(_, matcher)| matcher.is_match(&folded))
        .map(|(sector, _)| *sector)
        .unwrap_or(DetectedSector::Generic)
}

/// A declared non-generic sector always wins over detection.
pub fn resolve_sector(declared: Sector, detected: DetectedSector) -> Sector {
    if declared != Sector::Generic {
        declared
    } else {
        detected.scoring_sector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_payslip_as_employment() {
        let detected = detect_sector("Bulletin de paie - Salaire de base");
        assert_eq!(detected, DetectedSector::Employment);
        assert_eq!(detected.scoring_sector(), Sector::Rh);
    }

    #[test]
    fn accents_do_not_hide_keywords() {
        assert_eq!(detect_sector("Avis d'impôt sur le revenu"), DetectedSector::Government);
        assert_eq!(detect_sector("Diplôme national"), DetectedSector::Education);
    }

    #[test]
    fn unrelated_text_is_generic() {
        assert_eq!(detect_sector("hello world"), DetectedSector::Generic);
    }

    #[test]
    fn keywords_inside_longer_words_are_ignored() {
        for text in [
            "Attribution de logement social",
            "Contribution volontaire",
            "Travailleur freelance",
        ] {
            let detected = detect_sector(text);
            assert_eq!(detected, DetectedSector::Generic, "{text}");
            assert_eq!(resolve_sector(Sector::Generic, detected), Sector::Generic);
        }
        assert_eq!(detect_sector("Votre RIB: voir au verso"), DetectedSector::Banking);
    }

    #[test]
    fn declared_sector_takes_precedence() {
        assert_eq!(resolve_sector(Sector::Juridique, DetectedSector::Banking), Sector::Juridique);
        assert_eq!(resolve_sector(Sector::Generic, DetectedSector::Banking), Sector::Banque);
    }
}
