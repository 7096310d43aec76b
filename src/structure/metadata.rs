use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use super::config::StructureConfig;
use crate::models::{codes, MetadataTimeline};

/// `D:YYYYMMDDHHmm` once the prefix is normalized.
const MINUTE_PREFIX_LEN: usize = 14;

/// Parse a PDF date (`D:YYYYMMDDHHmmSSOHH'mm'`) to minute precision.
/// Missing trailing components default to the earliest value; the timezone
/// is ignored.
pub fn parse_pdf_date(raw: &str) -> Option<NaiveDateTime> {
    let body = raw.trim().strip_prefix("D:").unwrap_or(raw.trim());
    let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match digits.get(range) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6, 1)?, field(6..8, 1)?)?;
    date.and_hms_opt(field(8..10, 0)?, field(10..12, 0)?, 0)
}

/// Normalize to the `D:` form and keep the minute-precision prefix.
fn minute_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let normalized = if trimmed.starts_with("D:") {
        trimmed.to_string()
    } else {
        format!("D:{trimmed}")
    };
    normalized.chars().take(MINUTE_PREFIX_LEN).collect()
}

/// Build the metadata timeline of a container from its raw info entries.
pub fn analyze_timeline(
    creation_date: Option<String>,
    mod_date: Option<String>,
    producer: Option<String>,
    now: NaiveDateTime,
    config: &StructureConfig,
) -> MetadataTimeline {
    let mut issues = Vec::new();
    let producer = producer.unwrap_or_default();

    if producer.trim().is_empty() {
        issues.push(codes::METADATA_PRODUCER_MISSING.to_string());
    }
    let editing_tool = config.editing_tool(&producer);
    if editing_tool.is_some() {
        issues.push(codes::EDITING_SOFTWARE_PRODUCER.to_string());
    }

    if let (Some(created), Some(modified)) = (&creation_date, &mod_date) {
        if minute_key(created) != minute_key(modified) {
            issues.push(codes::TIMELINE_MODIFIED.to_string());
        }
    }

    let created_at = creation_date.as_deref().and_then(parse_pdf_date);
    match (&creation_date, created_at) {
        (Some(_), Some(created_at)) => {
            if now.signed_duration_since(created_at) < Duration::hours(config.recent_creation_hours) {
                issues.push(codes::METADATA_RECENTLY_CREATED.to_string());
            }
            if created_at.year() < config.oldest_plausible_year {
                issues.push(codes::METADATA_CREATION_DATE_SUSPICIOUS.to_string());
            }
        }
        (Some(_), None) => issues.push(codes::METADATA_CREATION_DATE_SUSPICIOUS.to_string()),
        (None, _) => {}
    }

    MetadataTimeline {
        creation_date,
        mod_date,
        producer: Some(producer),
        created_at,
        editing_tool,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_full_and_partial_dates() {
        assert_eq!(parse_pdf_date("D:20240105103045+01'00'"), Some(at(2024, 1, 5, 10, 30)));
        assert_eq!(parse_pdf_date("D:2023"), Some(at(2023, 1, 1, 0, 0)));
        assert_eq!(parse_pdf_date("20231301"), None);
        assert_eq!(parse_pdf_date("garbage"), None);
    }

    #[test]
    fn seconds_difference_is_not_a_modification() {
        let timeline = analyze_timeline(
            Some("D:20240105103000".into()),
            Some("D:20240105103059Z".into()),
            Some("Microsoft Word".into()),
            at(2024, 6, 1, 0, 0),
            &StructureConfig::default(),
        );
        assert!(timeline.issues.is_empty(), "{:?}", timeline.issues);
    }

    #[test]
    fn flags_modification_recent_creation_and_editor() {
        let timeline = analyze_timeline(
            Some("D:20240105103000".into()),
            Some("D:20240105113000".into()),
            Some("iLovePDF".into()),
            at(2024, 1, 5, 20, 0),
            &StructureConfig::default(),
        );
        assert!(timeline.issues.contains(&codes::TIMELINE_MODIFIED.to_string()));
        assert!(timeline.issues.contains(&codes::METADATA_RECENTLY_CREATED.to_string()));
        assert_eq!(timeline.editing_tool.as_deref(), Some("ilovepdf"));
    }

    #[test]
    fn recent_creation_does_not_need_mod_date() {
        let timeline = analyze_timeline(
            Some("D:20240105103000".into()),
            None,
            Some("LibreOffice".into()),
            at(2024, 1, 5, 12, 0),
            &StructureConfig::default(),
        );
        assert_eq!(timeline.issues, vec![codes::METADATA_RECENTLY_CREATED.to_string()]);
    }

    #[test]
    fn missing_producer_is_empty_not_absent() {
        let timeline =
            analyze_timeline(None, None, None, at(2024, 1, 1, 0, 0), &StructureConfig::default());
        assert_eq!(timeline.producer.as_deref(), Some(""));
        assert_eq!(timeline.issues, vec![codes::METADATA_PRODUCER_MISSING.to_string()]);
    }

    #[test]
    fn ancient_creation_date_looks_like_a_template() {
        let timeline = analyze_timeline(
            Some("D:19991231000000".into()),
            None,
            Some("Acrobat Distiller".into()),
            at(2024, 1, 1, 0, 0),
            &StructureConfig::default(),
        );
        assert!(timeline
            .issues
            .contains(&codes::METADATA_CREATION_DATE_SUSPICIOUS.to_string()));
    }
}
