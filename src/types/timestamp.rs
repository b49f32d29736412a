//! Timestamp parsing for the service's `tanggal` fields

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a service timestamp into wall-clock time.
///
/// Offset-qualified timestamps keep the wall-clock time of their own offset
/// rather than being shifted to UTC, so a `+07:00` reading displays the
/// time the sensor reported.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Split a raw timestamp into display date (`dd/mm/yyyy`) and time (`HH:MM:SS`).
///
/// Unparseable input is carried through as the date with an empty time.
pub fn split_date_time(raw: Option<&str>) -> (String, String) {
    match raw {
        None => (String::new(), String::new()),
        Some(s) => match parse_timestamp(s) {
            Some(dt) => (
                dt.format("%d/%m/%Y").to_string(),
                dt.format("%H:%M:%S").to_string(),
            ),
            None => (s.to_string(), String::new()),
        },
    }
}
