use crate::model::{CanonicalMonth, Cell, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of the data table with its logical fields picked out, before any validation.
///
/// A field is `None` when the table's schema does not locate it, or when the row is too short to
/// reach the declared column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub month: Option<Cell>,
    pub category: Option<Cell>,
    pub item: Option<Cell>,
    pub quantity: Option<Cell>,
}

impl RawRecord {
    pub fn new(
        month: impl Into<Cell>,
        category: impl Into<Cell>,
        item: impl Into<Cell>,
        quantity: impl Into<Cell>,
    ) -> Self {
        Self {
            month: Some(month.into()),
            category: Some(category.into()),
            item: Some(item.into()),
            quantity: Some(quantity.into()),
        }
    }
}

/// A validated data row: the month is canonical, the names are trimmed and non-empty, and the
/// quantity is finite.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NormalizedRecord {
    pub month: CanonicalMonth,
    pub category: String,
    pub item: String,
    pub quantity: Quantity,
}

/// The aggregation key of a record: the item and category joined by an underscore.
///
/// Two different pairs can produce the same key when a name itself contains an underscore, e.g.
/// `("a_b", "c")` and `("a", "b_c")`. Such pairs are aggregated together.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(item: &str, category: &str) -> Self {
        Self(format!("{item}_{category}"))
    }

    pub fn of(record: &NormalizedRecord) -> Self {
        Self::new(&record.item, &record.category)
    }
}

impl AsRef<str> for GroupKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The running monthly sums of one group.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AggregationEntry {
    pub item: String,
    pub category: String,
    pub monthly_quantities: BTreeMap<CanonicalMonth, Quantity>,
}

impl AggregationEntry {
    pub fn new(item: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            category: category.into(),
            monthly_quantities: BTreeMap::new(),
        }
    }

    /// Adds `quantity` to the sum for `month`, starting from zero.
    pub fn add(&mut self, month: CanonicalMonth, quantity: Quantity) {
        *self.monthly_quantities.entry(month).or_default() += quantity;
    }

    /// The sum recorded for `month`, zero when nothing was recorded.
    pub fn quantity(&self, month: &CanonicalMonth) -> Quantity {
        self.monthly_quantities
            .get(month)
            .copied()
            .unwrap_or_default()
    }
}
