//! Report-safe text and the input fingerprint.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::{ProofCertificate, ScoreReport};

static PII_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            "[REDACTED_EMAIL]",
        ),
        (r"(?:\+33\s?|\b0)[1-9](?:[\s.-]*\d{2}){4}\b", "[REDACTED_PHONE]"),
        (
            r"\b[12]\s?\d{2}\s?\d{2}\s?(?:\d{2}|2[AB])\s?\d{3}\s?\d{3}\s?\d{2}\b",
            "[REDACTED_SSN]",
        ),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("PII regex is valid"), label))
    .collect()
});

pub fn redact_pii(text: &str) -> String {
    PII_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (pattern, label)| {
            pattern.replace_all(&acc, *label).into_owned()
        })
}

/// First `max_chars` characters with PII masked, marked when truncated.
pub fn safe_snippet(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    let mut snippet = redact_pii(&head);
    if chars.next().is_some() {
        snippet.push_str("...");
    }
    snippet
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Bind the input fingerprint to the verdict it received.
pub fn issue_certificate(bytes: &[u8], score: &ScoreReport, issued_at: DateTime<Utc>) -> ProofCertificate {
    ProofCertificate {
        file_hash: sha256_hex(bytes),
        issued_at,
        risk_score: score.risk_score,
        verdict: score.verdict,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
