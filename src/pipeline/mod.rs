//! The normalization, aggregation and rollup pipeline.
//!
//! `transform` runs the three stages in order over the raw rows of the data table. Malformed rows
//! are dropped by the normalizer; a run with nothing left to aggregate fails as a whole.
mod aggregate;
mod normalize;
mod project;

pub use aggregate::{aggregate, Aggregation};
pub use normalize::{normalize, normalize_all, normalize_month};
pub use project::project;

use crate::error::RollupError;
use crate::model::{OutputMatrix, RawRecord};
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// Message used when the data table has no rows at all.
pub(crate) const NO_DATA: &str = "There is no data to process";

/// The result of one pipeline run.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Rollup {
    /// The matrix to write to the output table.
    pub matrix: OutputMatrix,
    /// Number of raw rows handed to the pipeline.
    pub rows_read: usize,
    /// Number of raw rows the normalizer dropped.
    pub rows_discarded: usize,
}

/// Normalizes `raw`, aggregates the survivors by item and category, and projects running totals.
///
/// # Errors
/// - `RollupError::EmptyInput` when `raw` is empty or when no row survives normalization.
pub fn transform(raw: &[RawRecord]) -> Result<Rollup> {
    if raw.is_empty() {
        return Err(RollupError::EmptyInput(NO_DATA.to_string()).into());
    }
    let (records, rows_discarded) = normalize_all(raw);
    debug!(
        "Normalized {} of {} rows ({} discarded)",
        records.len(),
        raw.len(),
        rows_discarded
    );
    let aggregation = aggregate(&records)?;
    let matrix = project(aggregation.entries(), aggregation.months().iter().copied());
    Ok(Rollup {
        matrix,
        rows_read: raw.len(),
        rows_discarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rollup_error;
    use crate::model::{CanonicalMonth, Quantity};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn q(n: i64) -> Quantity {
        Quantity::from(n)
    }

    #[test]
    fn test_scenario_single_group_two_months() {
        let raw = vec![
            RawRecord::new("2024/01/15", "Food", "Apple", 3.0),
            RawRecord::new("2024/01/20", "Food", "Apple", 2.0),
            RawRecord::new("2024/02/01", "Food", "Apple", 5.0),
        ];
        let rollup = transform(&raw).unwrap();
        let matrix = &rollup.matrix;
        assert_eq!(
            matrix.header(),
            vec!["item", "category", "2024/01/01", "2024/02/01"]
        );
        assert_eq!(matrix.rows().len(), 1);
        assert_eq!(matrix.rows()[0].item, "Apple");
        assert_eq!(matrix.rows()[0].category, "Food");
        assert_eq!(matrix.rows()[0].cumulative, vec![q(5), q(10)]);
        assert_eq!(rollup.rows_discarded, 0);
    }

    #[test]
    fn test_scenario_only_row_is_not_a_number() {
        let raw = vec![RawRecord::new("2024/01/15", "Food", "Apple", "abc")];
        let err = transform(&raw).unwrap_err();
        assert!(matches!(
            rollup_error(&err),
            Some(RollupError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_scenario_same_item_different_categories() {
        let raw = vec![
            RawRecord::new("2024/01/10", "Office", "Pen", 1.0),
            RawRecord::new("2024/01/11", "Art", "Pen", 10.0),
            RawRecord::new("2024/02/10", "Office", "Pen", 2.0),
        ];
        let matrix = transform(&raw).unwrap().matrix;
        assert_eq!(matrix.rows().len(), 2);
        assert_eq!(matrix.rows()[0].category, "Office");
        assert_eq!(matrix.rows()[0].cumulative, vec![q(1), q(3)]);
        assert_eq!(matrix.rows()[1].category, "Art");
        assert_eq!(matrix.rows()[1].cumulative, vec![q(10), q(10)]);
    }

    #[test]
    fn test_no_rows_is_empty_input() {
        let err = transform(&[]).unwrap_err();
        assert_eq!(
            rollup_error(&err),
            Some(&RollupError::EmptyInput(NO_DATA.to_string()))
        );
    }

    #[test]
    fn test_idempotent() {
        let raw = vec![
            RawRecord::new("2024/03/15", "Food", "Apple", "3"),
            RawRecord::new("2024/01/20", "Office", "Pen", "2"),
            RawRecord::new("2024/02/01", "Food", "Apple", "5"),
        ];
        assert_eq!(transform(&raw).unwrap(), transform(&raw).unwrap());
    }

    #[test]
    fn test_quantities_beyond_decimal_range_are_kept() {
        let raw = vec![RawRecord::new("2024/01/15", "Food", "Apple", 1e29)];
        let rollup = transform(&raw).unwrap();
        assert_eq!(rollup.rows_discarded, 0);
        assert_eq!(rollup.matrix.rows()[0].cumulative[0].to_f64(), 1e29);

        let raw = vec![
            RawRecord::new("2024/01/15", "Food", "Apple", "1e30"),
            RawRecord::new("2024/02/15", "Food", "Apple", "1e-30"),
        ];
        let binding = transform(&raw).unwrap();
        let cumulative = &binding.matrix.rows()[0].cumulative;
        assert_eq!(cumulative[0].to_f64(), 1e30);
        assert_eq!(cumulative[1].to_f64(), 1e30 + 1e-30);
    }

    #[test]
    fn test_sums_past_decimal_max_do_not_panic() {
        let max = "79228162514264337593543950335";
        let raw = vec![
            RawRecord::new("2024/01/15", "Food", "Apple", max),
            RawRecord::new("2024/01/16", "Food", "Apple", max),
            RawRecord::new("2024/02/15", "Food", "Apple", max),
        ];
        let rollup = transform(&raw).unwrap();
        let cumulative = &rollup.matrix.rows()[0].cumulative;
        let one = 79228162514264337593543950335_f64;
        assert_eq!(cumulative[0].to_f64(), 2.0 * one);
        assert_eq!(cumulative[1].to_f64(), 3.0 * one);
        assert_eq!(
            rollup.matrix.to_cells()[1][2],
            crate::model::Cell::Number(2.0 * one)
        );
    }

    fn raw_row_strategy() -> impl Strategy<Value = (u32, u32, usize, usize, i64)> {
        (2020u32..2026, 1u32..=12, 0usize..3, 0usize..3, 0i64..1000)
    }

    fn to_raw(rows: &[(u32, u32, usize, usize, i64)]) -> Vec<RawRecord> {
        const ITEMS: [&str; 3] = ["Apple", "Pen", "Bread"];
        const CATEGORIES: [&str; 3] = ["Food", "Office", "Art"];
        rows.iter()
            .map(|(year, month, item, category, quantity)| {
                RawRecord::new(
                    format!("{year}/{month:02}/15"),
                    CATEGORIES[*category],
                    ITEMS[*item],
                    quantity.to_string(),
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn cumulative_rows_never_decrease(
            rows in proptest::collection::vec(raw_row_strategy(), 1..40)
        ) {
            let matrix = transform(&to_raw(&rows)).unwrap().matrix;
            for row in matrix.rows() {
                for pair in row.cumulative.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
            }
        }

        #[test]
        fn deltas_reconstruct_monthly_sums(
            rows in proptest::collection::vec(raw_row_strategy(), 1..40)
        ) {
            let raw = to_raw(&rows);
            let (records, _) = normalize_all(&raw);
            let aggregation = aggregate(&records).unwrap();
            let matrix = transform(&raw).unwrap().matrix;
            prop_assert_eq!(matrix.rows().len(), aggregation.len());
            for (row, entry) in matrix.rows().iter().zip(aggregation.entries()) {
                let mut previous = Quantity::ZERO;
                for (month, cumulative) in matrix.months().iter().zip(&row.cumulative) {
                    prop_assert_eq!(*cumulative - previous, entry.quantity(month));
                    previous = *cumulative;
                }
            }
        }

        #[test]
        fn header_covers_every_distinct_month(
            rows in proptest::collection::vec(raw_row_strategy(), 1..40)
        ) {
            let matrix = transform(&to_raw(&rows)).unwrap().matrix;
            let expected: BTreeSet<CanonicalMonth> = rows
                .iter()
                .map(|(year, month, ..)| CanonicalMonth::new(*year as i32, *month).unwrap())
                .collect();
            prop_assert_eq!(matrix.header().len(), 2 + expected.len());
            prop_assert_eq!(matrix.months().to_vec(), expected.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn injected_bad_quantities_do_not_change_the_output(
            rows in proptest::collection::vec(raw_row_strategy(), 1..20),
            junk in proptest::collection::vec("[a-z]{1,6}", 0..10)
        ) {
            let clean = to_raw(&rows);
            let mut noisy = clean.clone();
            for (ix, text) in junk.iter().enumerate() {
                noisy.insert(ix % (noisy.len() + 1), RawRecord::new("2024/05/05", "Food", "Apple", text.as_str()));
            }
            let mut missing = RawRecord::new("2024/05/05", "Food", "Apple", "1");
            missing.quantity = None;
            noisy.push(missing);
            prop_assert_eq!(
                transform(&clean).unwrap().matrix,
                transform(&noisy).unwrap().matrix
            );
        }
    }
}
