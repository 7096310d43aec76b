use std::sync::LazyLock;

use regex::Regex;

use crate::models::codes;

pub const DOCUMENT_CONTENT_TOO_SPARSE: &str = "DOCUMENT_CONTENT_TOO_SPARSE";

const MIN_CHARS: usize = 50;
const GARBAGE_RATIO: f64 = 0.4;
const CAPS_RATIO: f64 = 0.8;
const MIN_LETTERS_FOR_CAPS: usize = 50;
const PLACEHOLDER_DOMAINS: [&str; 2] = ["example.com", "test.com"];

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("email regex is valid"));

/// Sector-independent hygiene checks on the text layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuality {
    pub sparse: bool,
    pub garbage: bool,
    pub excessive_caps: bool,
    pub placeholder_emails: Vec<String>,
}

impl TextQuality {
    /// True when the text itself looks manipulated. Sparse text only means
    /// there is little to judge.
    pub fn has_issue(&self) -> bool {
        self.garbage || self.excessive_caps || !self.placeholder_emails.is_empty()
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.sparse {
            warnings.push(DOCUMENT_CONTENT_TOO_SPARSE.to_string());
        }
        if self.garbage {
            warnings.push(codes::SUSPICIOUS_TEXT_QUALITY_GARBAGE.to_string());
        }
        if self.excessive_caps {
            warnings.push(codes::SUSPICIOUS_PATTERN_EXCESSIVE_CAPS.to_string());
        }
        for email in &self.placeholder_emails {
            warnings.push(format!("{}_{email}", codes::SUSPICIOUS_EMAIL_DOMAIN));
        }
        warnings
    }
}

pub fn check_text_quality(text: &str) -> TextQuality {
    if text.chars().count() < MIN_CHARS {
        return TextQuality {
            sparse: true,
            ..TextQuality::default()
        };
    }

    let mut quality = TextQuality::default();

    let (symbols, visible) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(symbols, visible), c| {
            (symbols + usize::from(!c.is_alphanumeric()), visible + 1)
        });
    if visible == 0 {
        return quality;
    }
    quality.garbage = symbols as f64 / visible as f64 > GARBAGE_RATIO;

    let (upper, letters) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(upper, letters), c| {
            (upper + usize::from(c.is_uppercase()), letters + 1)
        });
    quality.excessive_caps =
        letters >= MIN_LETTERS_FOR_CAPS && upper as f64 / letters as f64 > CAPS_RATIO;

    quality.placeholder_emails = EMAIL
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|email| {
            let lower = email.to_lowercase();
            PLACEHOLDER_DOMAINS.iter().any(|domain| lower.contains(domain))
        })
        .map(str::to_string)
        .collect();

    quality
}
