//! Checksum-protected identifiers: IBAN (ISO 13616 mod-97) and the French
//! NIR social-security number.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::IbanCheck;

static IBAN_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]{2}\d{2}(?: ?[A-Z0-9]{4}){2,7}(?: ?[A-Z0-9]{1,3})?\b")
        .expect("IBAN candidate regex is valid")
});

static IBAN_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{1,30}$").expect("IBAN shape regex is valid")
});

/// sex, year, month, department (Corsica as 2A/2B), commune, order, key.
static NIR_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[12] ?\d{2} ?\d{2} ?(?:\d{2}|2[AB]) ?\d{3} ?\d{3} ?\d{2}\b")
        .expect("NIR candidate regex is valid")
});

/// Registered IBAN lengths for the countries seen in practice. Used to cut a
/// greedy match that ran into the next token.
fn registered_length(country: &str) -> Option<usize> {
    let len = match country {
        "FR" | "MC" | "IT" => 27,
        "DE" | "GB" | "IE" => 22,
        "ES" | "SE" => 24,
        "PT" => 25,
        "BE" => 16,
        "NL" => 18,
        "CH" | "LI" => 21,
        "LU" | "AT" => 20,
        _ => return None,
    };
    Some(len)
}

fn compact(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Mod-97 validation: move the first four characters to the end, expand
/// letters to `A = 10 .. Z = 35`, and require a remainder of 1.
pub fn validate_iban(iban: &str) -> bool {
    let iban = compact(iban);
    if !IBAN_SHAPE.is_match(&iban) {
        return false;
    }
    let (head, tail) = iban.split_at(4);
    let remainder = tail.chars().chain(head.chars()).fold(0u32, |acc, c| {
        match c.to_digit(36) {
            Some(value) if value < 10 => (acc * 10 + value) % 97,
            Some(value) => (acc * 100 + value) % 97,
            None => acc,
        }
    });
    remainder == 1
}

/// Every IBAN-looking token in the text with its validation result.
pub fn scan_ibans(text: &str) -> Vec<IbanCheck> {
    IBAN_CANDIDATE
        .find_iter(text)
        .map(|found| {
            let mut iban = compact(found.as_str());
            if let Some(len) = registered_length(&iban[..2]) {
                iban.truncate(len);
            }
            let valid = validate_iban(&iban);
            IbanCheck { iban, valid }
        })
        .collect()
}

/// Digits of a NIR with the Corsican departments mapped to their numeric
/// stand-ins (2A → 19, 2B → 18).
fn nir_digits(nir: &str) -> Option<String> {
    let raw: String = nir
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();
    if raw.len() != 15 || !raw.is_ascii() {
        return None;
    }
    let digits = match &raw[5..7] {
        "2A" => format!("{}19{}", &raw[..5], &raw[7..]),
        "2B" => format!("{}18{}", &raw[..5], &raw[7..]),
        _ => raw,
    };
    digits.bytes().all(|b| b.is_ascii_digit()).then_some(digits)
}

/// A NIR is a 13-digit body and a 2-digit key with `key = 97 - body % 97`.
/// The key therefore ranges over 1..=97; a body divisible by 97 takes key
/// "97" and "00" is never valid.
pub fn validate_nir(nir: &str) -> bool {
    let Some(digits) = nir_digits(nir) else {
        return false;
    };
    let (Ok(body), Ok(key)) = (digits[..13].parse::<u64>(), digits[13..].parse::<u64>()) else {
        return false;
    };
    97 - body % 97 == key
}

/// NIR-shaped tokens in the text, spaces preserved as written.
pub fn find_nirs(text: &str) -> Vec<&str> {
    NIR_CANDIDATE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Compact form of a NIR token (spaces removed).
pub fn compact_nir(nir: &str) -> String {
    nir.chars().filter(|c| !c.is_whitespace()).collect()
}
