//! The Rollup Projector: turns monthly sums into running totals.

use crate::model::{AggregationEntry, CanonicalMonth, OutputMatrix, Quantity, RollupRow};

/// Builds the output matrix from `entries` (kept in the given order) and `months` (sorted and
/// deduplicated here). Each row carries, per month, the sum of the group's quantities up to and
/// including that month. Months a group never saw contribute zero.
///
/// Negative quantities are allowed and lower the running total.
pub fn project<'a, E, M>(entries: E, months: M) -> OutputMatrix
where
    E: IntoIterator<Item = &'a AggregationEntry>,
    M: IntoIterator<Item = CanonicalMonth>,
{
    let mut months: Vec<CanonicalMonth> = months.into_iter().collect();
    months.sort();
    months.dedup();

    let rows = entries
        .into_iter()
        .map(|entry| {
            let mut accumulated = Quantity::ZERO;
            let cumulative = months
                .iter()
                .map(|month| {
                    accumulated += entry.quantity(month);
                    accumulated
                })
                .collect();
            RollupRow {
                item: entry.item.clone(),
                category: entry.category.clone(),
                cumulative,
            }
        })
        .collect();

    OutputMatrix::new(months, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> CanonicalMonth {
        s.parse().unwrap()
    }

    fn entry(item: &str, category: &str, quantities: &[(&str, i64)]) -> AggregationEntry {
        let mut entry = AggregationEntry::new(item, category);
        for (m, q) in quantities {
            entry.add(month(m), Quantity::from(*q));
        }
        entry
    }

    #[test]
    fn test_running_totals() {
        let entries = vec![entry(
            "Apple",
            "Food",
            &[("2024/01/01", 5), ("2024/02/01", 5)],
        )];
        let matrix = project(&entries, vec![month("2024/02/01"), month("2024/01/01")]);
        assert_eq!(matrix.header(), vec!["item", "category", "2024/01/01", "2024/02/01"]);
        assert_eq!(
            matrix.rows()[0].cumulative,
            vec![Quantity::from(5), Quantity::from(10)]
        );
    }

    #[test]
    fn test_missing_months_carry_the_total_forward() {
        let entries = vec![
            entry("Pen", "Office", &[("2024/01/01", 2)]),
            entry("Pen", "Art", &[("2024/03/01", 7)]),
        ];
        let months = vec![month("2024/01/01"), month("2024/02/01"), month("2024/03/01")];
        let matrix = project(&entries, months);
        assert_eq!(
            matrix.rows()[0].cumulative,
            vec![Quantity::from(2), Quantity::from(2), Quantity::from(2)]
        );
        assert_eq!(
            matrix.rows()[1].cumulative,
            vec![Quantity::ZERO, Quantity::ZERO, Quantity::from(7)]
        );
    }

    #[test]
    fn test_duplicate_months_are_removed() {
        let entries = vec![entry("Apple", "Food", &[("2024/01/01", 1)])];
        let matrix = project(&entries, vec![month("2024/01/01"), month("2024/01/01")]);
        assert_eq!(matrix.months().len(), 1);
        assert_eq!(matrix.header().len(), 3);
    }

    #[test]
    fn test_negative_quantities_reduce_the_total() {
        let entries = vec![entry(
            "Apple",
            "Food",
            &[("2024/01/01", 5), ("2024/02/01", -3)],
        )];
        let matrix = project(&entries, vec![month("2024/01/01"), month("2024/02/01")]);
        assert_eq!(
            matrix.rows()[0].cumulative,
            vec![Quantity::from(5), Quantity::from(2)]
        );
    }

    #[test]
    fn test_rows_keep_entry_order() {
        let entries = vec![
            entry("Zucchini", "Veg", &[("2024/01/01", 1)]),
            entry("Apple", "Fruit", &[("2024/01/01", 1)]),
        ];
        let matrix = project(&entries, vec![month("2024/01/01")]);
        assert_eq!(matrix.rows()[0].item, "Zucchini");
        assert_eq!(matrix.rows()[1].item, "Apple");
    }
}
