//! The raw value of a single workbook cell.
//!
//! Backends hand cells to the store exactly as the host provides them: text, numbers, or date
//! values. Nothing is normalized here; the `Display` form is what a sheet would show as text.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};

/// A single cell value as read from, or written to, a workbook table.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    /// A cell with no content.
    #[default]
    Empty,
    /// A numeric cell.
    Number(f64),
    /// A text cell, stored verbatim (no trimming).
    Text(String),
    /// A date-typed cell.
    Date(DateTime<Utc>),
}

impl Cell {
    /// Creates a text cell. An empty string becomes `Cell::Empty`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    /// True when the cell would be falsy in a sheet formula sense: empty, blank text, or zero.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(n) => *n == 0.0 || n.is_nan(),
            Cell::Text(s) => s.is_empty(),
            Cell::Date(_) => false,
        }
    }

    /// Returns the cell as a `&str` if it is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Renders a date cell as an ISO-8601 string and leaves every other cell unchanged. This is
    /// how date values cross the store boundary for key/value style reads.
    pub fn with_iso_dates(self) -> Self {
        match self {
            Cell::Date(d) => Cell::Text(iso_string(&d)),
            other => other,
        }
    }
}

/// Formats a date the way a JavaScript `toISOString` would, e.g. `2024-01-15T00:00:00.000Z`.
pub(crate) fn iso_string(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => Display::fmt(n, f),
            Cell::Text(s) => Display::fmt(s, f),
            Cell::Date(d) => f.write_str(&iso_string(d)),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Empty => serializer.serialize_str(""),
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Date(d) => serializer.serialize_str(&iso_string(d)),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Number(value.to_f64().unwrap_or_default())
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Date(value)
    }
}
