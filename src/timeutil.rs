//! Timestamp parsing for snapshot records.
//!
//! Upstream payloads mix RFC 3339 (`2026-10-17T12:30:00Z`), naive
//! `YYYY-MM-DD HH:MM[:SS]` (treated as UTC) and bare dates. Anything else is
//! unparseable and maps to `None`; ordering code turns that into
//! [`SORT_SENTINEL`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Sort key used for records whose timestamp cannot be parsed.
/// Lower than any real timestamp, so a descending sort puts them last.
pub const SORT_SENTINEL: i64 = i64::MIN;

/// Parse a timestamp string into UTC. Returns `None` for empty/garbage input.
pub fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse an optional field; missing and unparseable collapse to `None`.
pub fn parse_opt(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_ts)
}

/// Millisecond sort key with the sentinel substituted for `None`.
pub fn sort_key(ts: Option<DateTime<Utc>>) -> i64 {
    ts.map(|t| t.timestamp_millis()).unwrap_or(SORT_SENTINEL)
}
