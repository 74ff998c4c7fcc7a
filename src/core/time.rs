// Timestamp helpers for the command path

use chrono::{DateTime, SecondsFormat, Utc};

/// Legacy agents stamp `2006-01-02T15:04:05-07:00`
pub const LEGACY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// PuppetDB expects millisecond precision in UTC
pub const BACKEND_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Convert a legacy offset timestamp into the backend's UTC millisecond form
///
/// Best effort: input that does not parse is returned unchanged.
pub fn to_backend_time(value: &str) -> String {
    match DateTime::parse_from_str(value, LEGACY_TIME_FORMAT) {
        Ok(parsed) => parsed.with_timezone(&Utc).format(BACKEND_TIME_FORMAT).to_string(),
        Err(_) => value.to_string(),
    }
}

/// RFC3339 with a numeric offset, second precision
pub fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}
