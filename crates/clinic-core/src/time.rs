//! Timestamp parsing and formatting.
//!
//! All persisted timestamps are clinic-local wall-clock strings. Historical
//! data carries two formats (ISO-8601 `T`-separated and a legacy
//! space-separated form), plus bare dates on test results, so parsing goes
//! through one fallible helper and each call site decides whether to skip,
//! default, or propagate on failure.

use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Storage format for full timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Legacy format found in older records.
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unparsable timestamp: {0:?}")]
pub struct TimeParseError(pub String);

/// Parse a stored timestamp string.
///
/// Accepts `%Y-%m-%dT%H:%M:%S` (with or without fractional seconds),
/// `%Y-%m-%d %H:%M:%S`, and a bare `%Y-%m-%d` (treated as midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, LEGACY_TIMESTAMP_FORMAT) {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(TimeParseError(s.to_string()))
}

/// Parse a stored date string (`%Y-%m-%d`), or the date component of a
/// full timestamp.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(d);
    }
    parse_timestamp(s).map(|dt| dt.date())
}

/// Current local time in the storage format.
pub fn now_stamp() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Format a timestamp in the storage format.
pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso() {
        let dt = parse_timestamp("2025-01-10T09:00:00").unwrap();
        assert_eq!(format_timestamp(dt), "2025-01-10T09:00:00");
    }

    #[test]
    fn test_parse_legacy_space_separated() {
        let dt = parse_timestamp("2025-01-10 09:30:00").unwrap();
        assert_eq!(format_timestamp(dt), "2025-01-10T09:30:00");
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_timestamp("2025-01-10T09:00:00.123456").unwrap();
        assert_eq!(dt.date().to_string(), "2025-01-10");
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let dt = parse_timestamp("2025-01-10").unwrap();
        assert_eq!(format_timestamp(dt), "2025-01-10T00:00:00");
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_timestamp("not a date").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_parse_date_from_full_timestamp() {
        let d = parse_date("2025-01-10T09:00:00").unwrap();
        assert_eq!(d.to_string(), "2025-01-10");
    }
}
