//! Date normalization and lenient timestamp parsing.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use kline_types::KlineError;

/// Accepted user-facing date layouts, tried in order. The canonical form is
/// the first entry.
const USER_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%Y.%m.%d", "%Y_%m_%d"];

/// Normalize a user-supplied date string to `YYYY-MM-DD`.
///
/// The empty string passes through unchanged (an open bound). Normalization
/// is idempotent: the canonical form is accepted and returned as-is.
///
/// # Errors
/// `KlineError::Symbol` when none of the accepted layouts match.
pub fn normalize_date(s: &str) -> Result<String, KlineError> {
    if s.is_empty() {
        return Ok(String::new());
    }
    for fmt in USER_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }
    Err(KlineError::symbol(format!("date format not recognized: {s}")))
}

/// Lenient timestamp parse for series row dates and cache-window bounds.
///
/// Daily dates land on midnight; bare `HHMM`/`HH:MM` clock strings (US
/// minute rows) attach to today's date. Returns `None` for the empty string
/// or anything unrecognizable.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in USER_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    for fmt in ["%H%M", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(today().and_time(t));
        }
    }
    None
}

/// Today's calendar date in the local timezone.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Render a timestamp back to the `YYYY-MM-DD` form vendors and stored
/// entries use.
#[must_use]
pub fn fmt_date(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_accepted_layout_normalizes() {
        for s in [
            "2024-01-02",
            "2024/01/02",
            "20240102",
            "2024.01.02",
            "2024_01_02",
        ] {
            assert_eq!(normalize_date(s).unwrap(), "2024-01-02");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_date("2024/01/02").unwrap();
        assert_eq!(normalize_date(&once).unwrap(), once);
    }

    #[test]
    fn garbage_is_a_symbol_error() {
        assert!(matches!(
            normalize_date("Jan 2, 2024"),
            Err(KlineError::Symbol(_))
        ));
        assert!(matches!(normalize_date("2024-13-40"), Err(KlineError::Symbol(_))));
    }

    #[test]
    fn empty_is_an_open_bound() {
        assert_eq!(normalize_date("").unwrap(), "");
        assert!(parse_date("").is_none());
    }

    #[test]
    fn clock_strings_attach_to_today() {
        let dt = parse_date("0935").unwrap();
        assert_eq!(dt.date(), today());
        assert_eq!(dt.format("%H:%M").to_string(), "09:35");
    }
}
