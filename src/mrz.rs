//! Machine-readable zone detection and ICAO 9303 / ISO 7501-1 check-digit
//! validation for TD1, TD2 and TD3 documents.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::models::{codes, Evidence, MrzData, MrzFindings, MrzFormat};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::mrz";

use crate::{log_debug, log_info};

const MIN_LINE_LEN: usize = 30;
const WEIGHTS: [u32; 3] = [7, 3, 1];

/// Where one checked field and its check digit sit in the zone.
struct FieldSpec {
    name: &'static str,
    line: usize,
    range: Range<usize>,
    check_at: usize,
}

impl MrzFormat {
    fn line_len(&self) -> usize {
        match self {
            MrzFormat::Td3 => 44,
            MrzFormat::Td2 => 36,
            MrzFormat::Td1 => 30,
        }
    }

    fn line_count(&self) -> usize {
        match self {
            MrzFormat::Td1 => 3,
            MrzFormat::Td2 | MrzFormat::Td3 => 2,
        }
    }

    /// Document number, birth date and expiry date, in that order.
    fn fields(&self) -> [FieldSpec; 3] {
        match self {
            // TD2 and TD3 share the second-line layout.
            MrzFormat::Td3 | MrzFormat::Td2 => [
                FieldSpec { name: "document_number", line: 1, range: 0..9, check_at: 9 },
                FieldSpec { name: "birth_date", line: 1, range: 13..19, check_at: 19 },
                FieldSpec { name: "expiry_date", line: 1, range: 21..27, check_at: 27 },
            ],
            MrzFormat::Td1 => [
                FieldSpec { name: "document_number", line: 0, range: 5..14, check_at: 14 },
                FieldSpec { name: "birth_date", line: 1, range: 0..6, check_at: 6 },
                FieldSpec { name: "expiry_date", line: 1, range: 8..14, check_at: 14 },
            ],
        }
    }
}

/// Weighted (7, 3, 1) modulo-10 check digit. Digits keep their value,
/// letters map to 10..=35, the filler and anything else count as 0.
pub fn check_digit(field: &str) -> u32 {
    field
        .chars()
        .zip(WEIGHTS.iter().cycle())
        .map(|(c, weight)| {
            let value = match c {
                '0'..='9' => c as u32 - '0' as u32,
                'A'..='Z' => c as u32 - 'A' as u32 + 10,
                'a'..='z' => c as u32 - 'a' as u32 + 10,
                _ => 0,
            };
            value * weight
        })
        .sum::<u32>()
        % 10
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MrzScanner;

impl MrzScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, text: &str) -> MrzFindings {
        let candidates: Vec<String> = text
            .lines()
            .map(|line| line.trim().replace(' ', ""))
            .filter(|line| line.len() >= MIN_LINE_LEN && is_mrz_alphabet(line))
            .collect();

        if candidates.is_empty() {
            return MrzFindings::default();
        }

        // Passports first, then TD2, then ID cards; the zone sits at the
        // bottom of the page so the last matching lines win.
        for format in [MrzFormat::Td3, MrzFormat::Td2, MrzFormat::Td1] {
            let lines: Vec<&String> = candidates
                .iter()
                .filter(|line| line.len() == format.line_len())
                .collect();
            if lines.len() >= format.line_count() {
                let zone: Vec<String> = lines[lines.len() - format.line_count()..]
                    .iter()
                    .map(|line| line.to_string())
                    .collect();
                return parse_zone(format, zone);
            }
        }

        log_debug!("{} MRZ-like lines found but no complete zone", candidates.len());
        MrzFindings::default()
    }
}

fn is_mrz_alphabet(line: &str) -> bool {
    line.bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'<')
}

fn parse_zone(format: MrzFormat, lines: Vec<String>) -> MrzFindings {
    let mut field_checks = BTreeMap::new();
    let mut values = Vec::with_capacity(3);

    for spec in format.fields() {
        // Lines are pure ASCII and length-checked, so byte slicing is safe.
        let line = lines[spec.line].as_str();
        let value = &line[spec.range.clone()];
        let passed = line[spec.check_at..=spec.check_at]
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .is_some_and(|expected| expected == check_digit(value));
        field_checks.insert(spec.name.to_string(), passed);
        values.push(value.to_string());
    }

    let valid_checksums = field_checks.values().all(|passed| *passed);
    log_info!(
        "MRZ {} found, checksums {}",
        format.label(),
        if valid_checksums { "valid" } else { "INVALID" }
    );

    let mut values = values.into_iter();
    let data = MrzData {
        document_number: values.next().unwrap_or_default().replace('<', ""),
        birth_date: values.next().unwrap_or_default(),
        expiry_date: values.next().unwrap_or_default(),
        field_checks,
    };

    MrzFindings {
        found: true,
        format: Some(format),
        valid_checksums,
        data: Some(data),
        raw_lines: lines,
    }
}

pub fn raise_evidence(findings: &MrzFindings, evidence: &mut Evidence) {
    if findings.found && !findings.valid_checksums {
        evidence.raise(codes::FRAUD_MRZ_CHECKSUM_INVALID);
    }
}
