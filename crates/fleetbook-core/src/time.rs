//! Conversions between stored epoch milliseconds and wire timestamps.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Convert stored epoch milliseconds into a UTC instant.
///
/// Out-of-range values clamp to the Unix epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse a caller-supplied instant: RFC 3339 (`2026-03-31T10:00:00Z`) or a
/// bare date (`2026-03-31`, taken as midnight UTC).
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a caller-supplied instant straight into epoch milliseconds.
pub fn parse_instant_millis(input: &str) -> Option<i64> {
    parse_instant(input).map(|dt| dt.timestamp_millis())
}
