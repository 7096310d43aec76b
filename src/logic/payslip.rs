use std::sync::LazyLock;

use regex::Regex;

use super::parse_amount;

static NET_TO_PAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:NET A PAYER|NET PAYÉ|NET À PAYER)[^0-9\n]*?(\d[\d \x{a0}\x{202f}]{0,15}(?:[.,]\d{2})?)")
        .expect("net salary regex is valid")
});

static GROSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:TOTAL BRUT|SALAIRE BRUT)[^0-9\n]*?(\d[\d \x{a0}\x{202f}]{0,15}(?:[.,]\d{2})?)")
        .expect("gross salary regex is valid")
});

/// French net-to-gross ratios sit between these bounds.
const MAX_NET_RATIO: f64 = 0.95;
const MIN_NET_RATIO: f64 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryVerdict {
    Coherent,
    /// Net above gross cannot happen.
    NetAboveGross,
    NetRatioHigh,
    NetRatioLow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryCheck {
    pub net: f64,
    pub gross: f64,
    pub verdict: SalaryVerdict,
}

impl SalaryCheck {
    pub fn warning(&self) -> Option<String> {
        match self.verdict {
            SalaryVerdict::Coherent => None,
            SalaryVerdict::NetAboveGross => Some(format!(
                "IMPOSSIBLE_NET_SALARY_HIGHER_THAN_GROSS (Net: {}, Brut: {})",
                self.net, self.gross
            )),
            SalaryVerdict::NetRatioHigh => {
                Some("SUSPICIOUS_HIGH_NET_SALARY (Net > 95% Brut)".to_string())
            }
            SalaryVerdict::NetRatioLow => {
                Some("SUSPICIOUS_LOW_NET_SALARY (Net < 40% Brut)".to_string())
            }
        }
    }
}

fn first_amount(regex: &Regex, text: &str) -> Option<f64> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_amount(m.as_str()))
}

/// Compare the net-to-pay figure with the gross salary. `None` unless both
/// figures are present.
pub fn check_salary(text: &str) -> Option<SalaryCheck> {
    let net = first_amount(&NET_TO_PAY, text)?;
    let gross = first_amount(&GROSS, text)?;

    let verdict = if net > gross {
        SalaryVerdict::NetAboveGross
    } else if net > gross * MAX_NET_RATIO {
        SalaryVerdict::NetRatioHigh
    } else if net < gross * MIN_NET_RATIO {
        SalaryVerdict::NetRatioLow
    } else {
        SalaryVerdict::Coherent
    };

    Some(SalaryCheck { net, gross, verdict })
}
