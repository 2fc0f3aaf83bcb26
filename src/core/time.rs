//! Timestamp helpers shared by the schema, catalog, and store.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Current UTC time as an RFC 3339 string with millisecond precision.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `value` is an RFC 3339 timestamp with an explicit offset or `Z`.
#[must_use]
pub fn is_rfc3339(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

/// Whether `value` is a real calendar date in `YYYY-MM-DD` form.
///
/// Chrono's `%m`/`%d` accept single digits, so the length check keeps the
/// zero-padded shape mandatory.
#[must_use]
pub fn is_calendar_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_timestamp_is_parseable_utc() {
        let stamp = now_rfc3339();
        assert!(is_rfc3339(&stamp), "should parse: {stamp}");
        assert!(stamp.ends_with('Z'), "should be UTC: {stamp}");
    }

    #[test]
    fn rfc3339_accepts_offsets_and_zulu() {
        assert!(is_rfc3339("2026-08-23T10:15:00Z"));
        assert!(is_rfc3339("2026-08-23T10:15:00.123Z"));
        assert!(is_rfc3339("2026-08-23T12:15:00+02:00"));
    }

    #[test]
    fn rfc3339_rejects_bare_dates_and_garbage() {
        assert!(!is_rfc3339("2026-08-23"));
        assert!(!is_rfc3339("not a timestamp"));
        assert!(!is_rfc3339(""));
    }

    #[test]
    fn calendar_date_requires_real_days() {
        assert!(is_calendar_date("2026-02-28"));
        assert!(is_calendar_date("2024-02-29"));
        assert!(!is_calendar_date("2026-02-30"));
        assert!(!is_calendar_date("2026-13-01"));
    }

    #[test]
    fn calendar_date_requires_zero_padding() {
        assert!(!is_calendar_date("2026-1-5"));
        assert!(!is_calendar_date("2026-08-2"));
        assert!(!is_calendar_date(""));
        assert!(!is_calendar_date("2026-08-23T00:00:00Z"));
    }
}
