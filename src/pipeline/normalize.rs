//! The Row Normalizer: a filter-and-transform over raw data rows.
//!
//! A row that cannot be normalized is dropped without an error. Only the caller decides whether
//! an empty result is a problem.

use crate::model::{CanonicalMonth, Cell, NormalizedRecord, Quantity, RawRecord};
use crate::time;

/// Normalizes one raw row, or returns `None` when the row is malformed and must be discarded.
///
/// - month: blank values are discarded; dates, date text, and epoch-millisecond numbers are
///   bucketed into their month in the reference time zone.
/// - category, item: converted to text and trimmed; empty results are discarded.
/// - quantity: coerced to a number; a missing field or a non-number is discarded.
pub fn normalize(raw: &RawRecord) -> Option<NormalizedRecord> {
    let month = normalize_month(raw.month.as_ref()?)?;
    let category = normalize_name(raw.category.as_ref())?;
    let item = normalize_name(raw.item.as_ref())?;
    let quantity = Quantity::from_cell(raw.quantity.as_ref()?)?;
    Some(NormalizedRecord {
        month,
        category,
        item,
        quantity,
    })
}

/// Normalizes every row, keeping the survivors in their original order. Also returns the number
/// of rows that were discarded.
pub fn normalize_all<'a, I>(raw: I) -> (Vec<NormalizedRecord>, usize)
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut discarded = 0;
    let mut records = Vec::new();
    for row in raw {
        match normalize(row) {
            Some(record) => records.push(record),
            None => discarded += 1,
        }
    }
    (records, discarded)
}

/// Buckets a month cell into its canonical month.
pub fn normalize_month(cell: &Cell) -> Option<CanonicalMonth> {
    if cell.is_blank() {
        return None;
    }
    match cell {
        Cell::Empty => None,
        Cell::Date(d) => Some(time::month_of_instant(d)),
        Cell::Number(millis) => time::month_of_millis(*millis),
        Cell::Text(s) => time::parse_month_text(s),
    }
}

fn normalize_name(cell: Option<&Cell>) -> Option<String> {
    let cell = cell?;
    if cell.is_blank() {
        return None;
    }
    let trimmed = cell.to_string().trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
