//! Date and time coercion for response fields.
//!
//! Xero returns timestamps in at least three encodings:
//!
//! - ISO-8601, with or without an offset, with a `T` or space separator and
//!   fractional seconds of any precision (`2017-10-31T12:50:15.9920037`)
//! - the Microsoft JSON wrapper `/Date(1509454062181)/`, optionally with an
//!   offset (`/Date(1439813704613+0000)/`), in milliseconds
//! - integer epoch seconds
//!
//! All of them normalize to a [`DateTime<Utc>`]. Values without an offset are
//! taken as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn iso_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?(Z|[+-]\d{2}:?\d{2})?)?$",
            )
            .ok()
        })
        .as_ref()
}

fn ms_date_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^/Date\((-?\d+)([+-]\d{4})?\)/$").ok())
        .as_ref()
}

/// Returns `true` if a field with this name holds a date or timestamp.
///
/// Matching is case-insensitive: names ending in `utc`, `date` or
/// `datetime`, or starting with `dateofbirth`.
///
/// ```rust
/// use xero_api::response::is_date_field;
///
/// assert!(is_date_field("UpdatedDateUTC"));
/// assert!(is_date_field("DueDate"));
/// assert!(is_date_field("DateOfBirth"));
/// assert!(!is_date_field("Status"));
/// ```
#[must_use]
pub fn is_date_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.ends_with("utc")
        || name.ends_with("date")
        || name.ends_with("datetime")
        || name.starts_with("dateofbirth")
}

/// Parses a timestamp string in any of the supported encodings.
///
/// Returns `None` for anything that is not recognizably a timestamp.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some(captures) = ms_date_pattern().and_then(|p| p.captures(value)) {
        let millis: i64 = captures.get(1)?.as_str().parse().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }

    let captures = iso_pattern()?.captures(value)?;
    let number = |index: usize| -> Option<u32> {
        captures
            .get(index)
            .map_or(Some(0), |m| m.as_str().parse().ok())
    };

    let year: i32 = captures.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, number(2)?, number(3)?)?;

    let nanos = match captures.get(7) {
        Some(fraction) => {
            // Pad or truncate to nanosecond precision.
            let digits: String = fraction
                .as_str()
                .chars()
                .chain(std::iter::repeat('0'))
                .take(9)
                .collect();
            digits.parse().ok()?
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(number(4)?, number(5)?, number(6)?, nanos)?;
    let naive = NaiveDateTime::new(date, time);

    match captures.get(8).map(|m| m.as_str()) {
        None | Some("Z") => Some(Utc.from_utc_datetime(&naive)),
        Some(offset) => {
            let offset = parse_offset(offset)?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}

fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let digits: String = offset.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Converts a JSON value to a timestamp if it holds one.
///
/// Strings go through [`parse_timestamp`]. Integer numbers are epoch
/// seconds. Everything else, including strings of digits and floats,
/// yields `None`.
#[must_use]
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}
