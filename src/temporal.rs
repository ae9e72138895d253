// ⏰ Temporal helpers - reporting windows and timestamp formatting
//
// Every timestamp the ledger writes uses one fixed-width UTC form:
//   YYYY-MM-DDTHH:MM:SS.sssZ
// Range filtering compares these strings lexicographically, which only
// matches chronological order while all stored values share that form.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const CANONICAL_LEN: usize = 24;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Render a UTC instant in the ledger's canonical timestamp form
pub fn iso_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Canonical timestamp `days` before `now`
pub fn iso_days_ago(now: DateTime<Utc>, days: i64) -> String {
    iso_timestamp(now - Duration::days(days))
}

/// True when `ts` is exactly in the canonical fixed-width UTC form
pub fn is_canonical_timestamp(ts: &str) -> bool {
    ts.len() == CANONICAL_LEN && NaiveDateTime::parse_from_str(ts, CANONICAL_FORMAT).is_ok()
}

/// Offset from minutes east of UTC; `None` when out of range
pub fn utc_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Human rendering for tables: `YYYY-MM-DD HH:MM` at `offset`.
/// Unparseable input is returned as-is.
pub fn format_local(ts: &str, offset: &FixedOffset) -> String {
    match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.with_timezone(offset).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => ts.to_string(),
    }
}

/// Short month label ("Jan".."Dec") for a 1-based month
pub fn month_label(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_LABELS[(month - 1) as usize],
        _ => "???",
    }
}

/// (year, month) of `now` as seen at `offset`
pub fn current_month(now: DateTime<Utc>, offset: &FixedOffset) -> (i32, u32) {
    use chrono::Datelike;
    let local = now.with_timezone(offset);
    (local.year(), local.month())
}

// ============================================================================
// WINDOW
// ============================================================================

/// Half-open reporting range `[start, end)` over canonical timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: String,
    pub end: String,
}

impl Window {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Window {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Calendar month in UTC
    pub fn month(year: i32, month: u32) -> Option<Self> {
        Self::month_at(year, month, &FixedOffset::east_opt(0)?)
    }

    /// Calendar month whose boundaries fall at local midnight for `offset`
    pub fn month_at(year: i32, month: u32, offset: &FixedOffset) -> Option<Self> {
        let start = month_start(year, month, offset)?;
        let end = if month == 12 {
            month_start(year + 1, 1, offset)?
        } else {
            month_start(year, month + 1, offset)?
        };

        Some(Window {
            start: iso_timestamp(start),
            end: iso_timestamp(end),
        })
    }

    pub fn contains(&self, ts: &str) -> bool {
        ts >= self.start.as_str() && ts < self.end.as_str()
    }
}

fn month_start(year: i32, month: u32, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let local = offset.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()?;
    Some(local.with_timezone(&Utc))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_is_fixed_width() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let ts = iso_timestamp(dt);

        assert_eq!(ts, "2024-03-05T07:08:09.000Z");
        assert!(is_canonical_timestamp(&ts));
    }

    #[test]
    fn test_iso_days_ago() {
        let now = Utc.with_ymd_and_hms(2024, 3, 18, 12, 0, 0).unwrap();
        assert_eq!(iso_days_ago(now, 18), "2024-02-29T12:00:00.000Z");
    }

    #[test]
    fn test_non_canonical_timestamps_detected() {
        assert!(!is_canonical_timestamp("2024-03-05T07:08:09Z"));
        assert!(!is_canonical_timestamp("2024-03-05T07:08:09.000+05:00"));
        assert!(!is_canonical_timestamp("03/05/2024"));
        assert!(!is_canonical_timestamp(""));
    }

    #[test]
    fn test_month_window_utc() {
        let w = Window::month(2024, 1).unwrap();
        assert_eq!(w.start, "2024-01-01T00:00:00.000Z");
        assert_eq!(w.end, "2024-02-01T00:00:00.000Z");
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let w = Window::month(2024, 12).unwrap();
        assert_eq!(w.start, "2024-12-01T00:00:00.000Z");
        assert_eq!(w.end, "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_month_window_with_offset() {
        let tashkent = utc_offset(5 * 60).unwrap();
        let w = Window::month_at(2024, 1, &tashkent).unwrap();
        assert_eq!(w.start, "2023-12-31T19:00:00.000Z");
        assert_eq!(w.end, "2024-01-31T19:00:00.000Z");
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(Window::month(2024, 0).is_none());
        assert!(Window::month(2024, 13).is_none());
    }

    #[test]
    fn test_window_is_half_open() {
        let w = Window::month(2024, 5).unwrap();
        assert!(w.contains("2024-05-01T00:00:00.000Z"));
        assert!(w.contains("2024-05-31T23:59:59.999Z"));
        assert!(!w.contains("2024-06-01T00:00:00.000Z"));
        assert!(!w.contains("2024-04-30T23:59:59.999Z"));
    }

    #[test]
    fn test_format_local() {
        let utc = utc_offset(0).unwrap();
        let plus5 = utc_offset(300).unwrap();
        assert_eq!(format_local("2024-05-01T10:30:00.000Z", &utc), "2024-05-01 10:30");
        assert_eq!(format_local("2024-05-01T22:30:00.000Z", &plus5), "2024-05-02 03:30");
        assert_eq!(format_local("yesterday", &utc), "yesterday");
    }

    #[test]
    fn test_month_labels() {
        assert_eq!(month_label(1), "Jan");
        assert_eq!(month_label(12), "Dec");
        assert_eq!(month_label(0), "???");
    }

    #[test]
    fn test_current_month_respects_offset() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 22, 0, 0).unwrap();
        assert_eq!(current_month(now, &utc_offset(0).unwrap()), (2024, 1));
        assert_eq!(current_month(now, &utc_offset(180).unwrap()), (2024, 2));
    }
}
