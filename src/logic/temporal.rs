use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2})/(\d{2})/(\d{4})\b").expect("day-first date regex is valid")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("ISO date regex is valid")
});

/// Calendar dates written as `DD/MM/YYYY` or `YYYY-MM-DD`. Impossible dates
/// (31/02, month 13) are skipped.
pub fn find_dates(text: &str) -> Vec<NaiveDate> {
    let day_first = DAY_FIRST.captures_iter(text).filter_map(|caps| {
        ymd(&caps[3], &caps[2], &caps[1])
    });
    let iso = ISO_DATE
        .captures_iter(text)
        .filter_map(|caps| ymd(&caps[1], &caps[2], &caps[3]));
    day_first.chain(iso).collect()
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// A document cannot mention a date more than one day after its file was
/// created.
pub fn has_time_paradox(text: &str, created_at: NaiveDateTime) -> bool {
    find_dates(text)
        .into_iter()
        .filter_map(|date| date.and_hms_opt(0, 0, 0))
        .any(|mentioned| mentioned > created_at && (mentioned - created_at).num_days() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn parses_both_formats_and_skips_impossible_dates() {
        let dates = find_dates("Le 25/12/2023, puis 2024-01-05. Faux: 31/02/2024.");
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 12, 25).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            ]
        );
    }

    #[test]
    fn future_date_is_a_paradox() {
        assert!(has_time_paradox("Paiement le 15/03/2024", created(2024, 1, 10)));
    }

    #[test]
    fn next_day_is_tolerated() {
        assert!(!has_time_paradox("Paiement le 11/01/2024", created(2024, 1, 10)));
        assert!(!has_time_paradox("Periode 2023-12-01", created(2024, 1, 10)));
    }
}
