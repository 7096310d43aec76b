use std::sync::LazyLock;

use regex::Regex;

use super::parse_amount;

const AMOUNT: &str = r"(\d[\d \x{a0}\x{202f}]{0,15}(?:[.,]\d{2})?)";

static TOTAL_EXCL_TAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)TOTAL\s*H\.?T\.?[^0-9\n]*?{AMOUNT}"))
        .expect("total HT regex is valid")
});

static VAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:TOTAL|MONTANT)\s+(?:DE\s+LA\s+)?TVA(?:\s*\(?\d{{1,2}}(?:[.,]\d+)?\s*%\)?)?[^0-9\n]*?{AMOUNT}"))
        .expect("VAT regex is valid")
});

static TOTAL_INCL_TAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)TOTAL\s*T\.?T\.?C\.?[^0-9\n]*?{AMOUNT}"))
        .expect("total TTC regex is valid")
});

/// Rounding slack allowed between `HT + TVA` and `TTC`.
pub const TOTAL_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub excl_tax: f64,
    pub vat: f64,
    pub incl_tax: f64,
}

impl InvoiceTotals {
    pub fn is_consistent(&self) -> bool {
        (self.excl_tax + self.vat - self.incl_tax).abs() <= TOTAL_TOLERANCE
    }

    pub fn describe(&self) -> String {
        format!(
            "HT: {:.2}, TVA: {:.2}, TTC: {:.2}",
            self.excl_tax, self.vat, self.incl_tax
        )
    }
}

fn first_amount(regex: &Regex, text: &str) -> Option<f64> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_amount(m.as_str()))
}

/// The three invoice totals, when all of them are labelled in the text.
pub fn extract_totals(text: &str) -> Option<InvoiceTotals> {
    Some(InvoiceTotals {
        excl_tax: first_amount(&TOTAL_EXCL_TAX, text)?,
        vat: first_amount(&VAT, text)?,
        incl_tax: first_amount(&TOTAL_INCL_TAX, text)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_invoice() {
        let totals = extract_totals(
            "FACTURE N° 42\nTotal HT : 1 000,00 €\nMontant TVA (20%) : 200,00 €\nTotal TTC : 1 200,00 €",
        )
        .unwrap();
        assert_eq!(totals.excl_tax, 1000.0);
        assert_eq!(totals.vat, 200.0);
        assert_eq!(totals.incl_tax, 1200.0);
        assert!(totals.is_consistent());
    }

    #[test]
    fn edited_total_breaks_the_sum() {
        let totals =
            extract_totals("TOTAL HT 500.00\nTOTAL TVA 100.00\nTOTAL TTC 900.00").unwrap();
        assert!(!totals.is_consistent());
    }

    #[test]
    fn partial_totals_are_ignored() {
        assert!(extract_totals("TOTAL TTC 120,00").is_none());
    }
}
