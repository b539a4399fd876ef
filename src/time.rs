//! Time utilities: month bucketing in a fixed reference time zone.
//!
//! Months are always computed in Asia/Tokyo so that the same instant lands in the same bucket no
//! matter where the program runs. Date-only text is taken as a calendar date in that zone.

use crate::model::CanonicalMonth;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// The zone in which instants are assigned to calendar months.
pub const REFERENCE_TZ: Tz = chrono_tz::Asia::Tokyo;

/// Date-time layouts accepted in text cells, read as wall-clock time in `REFERENCE_TZ`.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Date layouts accepted in text cells. `%b` also matches full month names.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%a %b %d %Y",
];

/// The month that contains `instant` in `REFERENCE_TZ`.
pub fn month_of_instant(instant: &DateTime<Utc>) -> CanonicalMonth {
    CanonicalMonth::of(instant.with_timezone(&REFERENCE_TZ))
}

/// The month that contains the epoch-millisecond timestamp `millis`, if it is representable.
pub fn month_of_millis(millis: f64) -> Option<CanonicalMonth> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis.trunc() as i64)
        .single()
        .map(|d| month_of_instant(&d))
}

/// Parses date text into the month it falls in. Text with an explicit offset (RFC 3339 or
/// RFC 2822) is converted into `REFERENCE_TZ` first; everything else is read as a local calendar
/// date. A year and month alone (`2024/03`, `2024-03`) are accepted too, and so is a bare four-digit
/// year, which means January.
pub fn parse_month_text(text: &str) -> Option<CanonicalMonth> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        return CanonicalMonth::new(text.parse().ok()?, 1);
    }

    let with_offset =
        DateTime::parse_from_rfc3339(text).or_else(|_| DateTime::parse_from_rfc2822(text));
    if let Ok(d) = with_offset {
        return Some(month_of_instant(&d.with_timezone(&Utc)));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(CanonicalMonth::of(ndt.date()));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(CanonicalMonth::of(date));
        }
    }

    // Year and month only
    let with_day = if text.contains('/') {
        format!("{text}/01")
    } else {
        format!("{text}-01")
    };
    ["%Y/%m/%d", "%Y-%m-%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&with_day, format).ok())
        .map(CanonicalMonth::of)
}

/// Formats `instant` as `yyyy/MM/dd` in `REFERENCE_TZ`.
pub fn format_ymd(instant: &DateTime<Utc>) -> String {
    instant
        .with_timezone(&REFERENCE_TZ)
        .format("%Y/%m/%d")
        .to_string()
}
