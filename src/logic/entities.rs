use std::sync::LazyLock;

use regex::Regex;

use super::identifiers::{compact_nir, find_nirs};
use crate::models::ExtractedEntities;

static NAME_AFTER_CIVILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:M\.|Mme|Mlle|Nom\s*[:.\-])\s*([A-Z][A-Z' \-]+)")
        .expect("civility regex is valid")
});

static POSTAL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,4},?\s+[\w' \-.,]+?\s\d{5}\s+[A-Z][A-Za-z'\-]+(?: [A-Z][A-Za-z'\-]+)*)",
    )
    .expect("address regex is valid")
});

/// Best-effort identity fields used to cross-check documents of one file.
pub fn extract_entities(text: &str) -> ExtractedEntities {
    let ssn = find_nirs(text).first().map(|nir| compact_nir(nir));
    let name = NAME_AFTER_CIVILITY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty());
    let address = POSTAL_ADDRESS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    ExtractedEntities { ssn, name, address }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_address_and_ssn() {
        let text = "M. DUPONT JEAN\n12 rue de la Paix 75002 Paris\nN° SS 1 80 05 92 123 456 53\n";
        let entities = extract_entities(text);
        assert_eq!(entities.name.as_deref(), Some("DUPONT JEAN"));
        assert_eq!(entities.address.as_deref(), Some("12 rue de la Paix 75002 Paris"));
        assert_eq!(entities.ssn.as_deref(), Some("180059212345653"));
    }

    #[test]
    fn missing_fields_stay_empty() {
        let entities = extract_entities("facture sans identite");
        assert_eq!(entities, ExtractedEntities::default());
    }
}
