pub mod logging;

use std::fmt::Display;

/// Resolve a best-effort sub-signal: on failure, log which signal degraded
/// and fall back to its neutral value.
pub fn or_neutral<T, E: Display>(signal: &str, result: Result<T, E>, neutral: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::warn!(
                target: "docforensics::best_effort",
                "{} degraded to neutral value: {}",
                signal,
                err
            );
            neutral
        }
    }
}

/// Uppercase and strip the French diacritics that OCR and PDF text layers
/// emit inconsistently, so keyword matching sees one spelling.
pub fn fold_upper(text: &str) -> String {
    text.chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'À' | 'Â' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Î' | 'Ï' => 'I',
            'Ô' | 'Ö' => 'O',
            'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            '’' => '\'',
            other => other,
        })
        .collect()
}
