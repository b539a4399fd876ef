//! The Aggregator: folds normalized records into per-group monthly sums.

use crate::error::RollupError;
use crate::model::{AggregationEntry, CanonicalMonth, GroupKey, NormalizedRecord};
use crate::Result;
use std::collections::{BTreeSet, HashMap};

/// Message used when no record survives normalization.
pub(crate) const NO_VALID_DATA: &str = "No valid data was found";

/// The groups found in a run, in the order each group was first seen, plus every month seen.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Aggregation {
    entries: Vec<AggregationEntry>,
    index: HashMap<GroupKey, usize>,
    months: BTreeSet<CanonicalMonth>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` to its group, creating the group on first sight.
    pub fn add(&mut self, record: &NormalizedRecord) {
        let key = GroupKey::of(record);
        let ix = match self.index.get(&key) {
            Some(ix) => *ix,
            None => {
                self.entries
                    .push(AggregationEntry::new(&record.item, &record.category));
                let ix = self.entries.len() - 1;
                self.index.insert(key, ix);
                ix
            }
        };
        self.entries[ix].add(record.month, record.quantity);
        self.months.insert(record.month);
    }

    /// Groups in first-seen order.
    pub fn entries(&self) -> &[AggregationEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &GroupKey) -> Option<&AggregationEntry> {
        self.index.get(key).map(|ix| &self.entries[*ix])
    }

    /// Every distinct month seen, in ascending order.
    pub fn months(&self) -> &BTreeSet<CanonicalMonth> {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Groups `records` by item and category and sums their quantities per month.
///
/// # Errors
/// - `RollupError::EmptyInput` when no group was produced.
pub fn aggregate<'a, I>(records: I) -> Result<Aggregation>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut aggregation = Aggregation::new();
    for record in records {
        aggregation.add(record);
    }
    if aggregation.is_empty() {
        return Err(RollupError::EmptyInput(NO_VALID_DATA.to_string()).into());
    }
    Ok(aggregation)
}
