//! Per-character font attribution from page content streams.

use std::collections::BTreeMap;

use lopdf::content::Operation;
use lopdf::Object;

use super::config::StructureConfig;
use crate::models::{FontAnalysis, FontOutlier, FontUsage};

const SAMPLE_CHARS: usize = 40;

/// Running tally for one font across the document.
#[derive(Debug, Default, Clone)]
pub struct FontTally {
    characters: BTreeMap<String, u32>,
    samples: BTreeMap<String, String>,
}

impl FontTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute the text-showing operators of one page. `fonts` maps the
    /// page's font resource names to `(BaseFont, is_composite)`.
    pub fn add_page(&mut self, operations: &[Operation], fonts: &BTreeMap<String, (String, bool)>) {
        let mut current: Option<(String, bool)> = None;
        for op in operations {
            match op.operator.as_str() {
                "Tf" => {
                    current = match op.operands.first() {
                        Some(Object::Name(name)) => {
                            let key = String::from_utf8_lossy(name).into_owned();
                            Some(
                                fonts
                                    .get(&key)
                                    .map(|(base, composite)| (strip_subset(base), *composite))
                                    .unwrap_or((key, false)),
                            )
                        }
                        _ => None,
                    };
                }
                "Tj" | "'" | "\"" | "TJ" => {
                    let Some((font, composite)) = &current else {
                        continue;
                    };
                    for bytes in shown_strings(op) {
                        self.record(font, *composite, bytes);
                    }
                }
                _ => {}
            }
        }
    }

    fn record(&mut self, font: &str, composite: bool, bytes: &[u8]) {
        let count = if composite {
            bytes.len() / 2
        } else {
            bytes.iter().filter(|b| !b.is_ascii_whitespace()).count()
        };
        if count == 0 {
            return;
        }
        *self.characters.entry(font.to_string()).or_default() +=
            u32::try_from(count).unwrap_or(u32::MAX);

        let sample = self.samples.entry(font.to_string()).or_default();
        if !composite && sample.len() < SAMPLE_CHARS {
            let room = SAMPLE_CHARS - sample.len();
            sample.extend(
                bytes
                    .iter()
                    .filter(|b| b.is_ascii_graphic() || **b == b' ')
                    .take(room)
                    .map(|&b| char::from(b)),
            );
        }
    }

    pub fn finish(self, config: &StructureConfig) -> FontAnalysis {
        let total: u32 = self.characters.values().sum();
        if total == 0 {
            return FontAnalysis::default();
        }

        let share = |count: u32| f64::from(count) / f64::from(total) * 100.0;
        let fonts_found: Vec<FontUsage> = self
            .characters
            .iter()
            .map(|(name, &characters)| FontUsage {
                name: name.clone(),
                characters,
                share: share(characters),
            })
            .collect();

        // Ties go to the alphabetically first name, which BTreeMap order gives.
        let dominant = fonts_found
            .iter()
            .fold(None::<&FontUsage>, |best, font| match best {
                Some(best) if best.characters >= font.characters => Some(best),
                _ => Some(font),
            })
            .map(|font| font.name.clone())
            .unwrap_or_default();
        let dominant_family = family(&dominant);

        let suspicious_fonts = fonts_found
            .iter()
            .filter(|font| {
                font.share < config.font_outlier_max_share_pct
                    && font.characters > config.font_outlier_min_chars
                    && family(&font.name) != dominant_family
            })
            .map(|font| FontOutlier {
                font: font.name.clone(),
                characters: font.characters,
                share: font.share,
                dominant_font: dominant.clone(),
                sample: self.samples.get(&font.name).cloned().unwrap_or_default(),
            })
            .collect();

        FontAnalysis {
            fonts_found,
            suspicious_fonts,
            total_analyzed_chars: total,
        }
    }
}

/// String operands painted by a text-showing operator.
fn shown_strings(op: &Operation) -> Vec<&[u8]> {
    match op.operator.as_str() {
        "TJ" => match op.operands.first() {
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Object::String(bytes, _) => Some(bytes.as_slice()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        // `"` takes word spacing and char spacing before the string.
        _ => match op.operands.last() {
            Some(Object::String(bytes, _)) => vec![bytes.as_slice()],
            _ => Vec::new(),
        },
    }
}

/// `ABCDEF+Helvetica-Bold` → `Helvetica-Bold`.
pub fn strip_subset(name: &str) -> String {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest.to_string()
        }
        _ => name.to_string(),
    }
}

/// `Helvetica-Bold` and `Helvetica,Italic` both belong to `helvetica`.
pub fn family(name: &str) -> String {
    name.split(['-', ','])
        .next()
        .unwrap_or(name)
        .to_lowercase()
}
