use crate::commands::Out;
use crate::model::CanonicalMonth;
use crate::pipeline;
use crate::store::TableStore;
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// What a transform run did.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TransformSummary {
    /// The number of (item, category) rows written below the header.
    pub groups: usize,
    /// The number of month columns written.
    pub months: usize,
    /// Data rows handed to the pipeline.
    pub rows_read: usize,
    /// Data rows dropped because a field could not be normalized.
    pub rows_discarded: usize,
    pub first_month: Option<CanonicalMonth>,
    pub last_month: Option<CanonicalMonth>,
}

/// Reads the data table, rolls it up, and replaces the contents of the operation table with the
/// result.
///
/// Either the operation table is fully replaced or it is left untouched: the pipeline runs
/// before anything is written, and the new content replaces the old in a single step.
///
/// # Errors
/// - `RollupError::EmptyInput` when there are no data rows or none of them is valid.
/// - `RollupError::MissingSink` when the operation table does not exist.
pub async fn transform(store: &mut TableStore) -> Result<Out<TransformSummary>> {
    let records = store.data_records().await?;
    let rollup = pipeline::transform(&records)?;

    let sink = store.tables().operation.clone();
    let cells = rollup.matrix.to_cells();
    debug!("Writing {} rows to '{sink}'", cells.len());
    store.replace(&sink, &cells).await?;

    let months = rollup.matrix.months();
    let summary = TransformSummary {
        groups: rollup.matrix.rows().len(),
        months: months.len(),
        rows_read: rollup.rows_read,
        rows_discarded: rollup.rows_discarded,
        first_month: months.first().copied(),
        last_month: months.last().copied(),
    };
    Ok(Out::new(
        format!(
            "Wrote {} groups over {} months to '{sink}'",
            summary.groups, summary.months
        ),
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MemoryWorkbook, DATA, OPERATION};
    use crate::error::{rollup_error, RollupError};
    use crate::model::Cell;
    use crate::test::{SharedWorkbook, TestEnv};

    #[tokio::test]
    async fn test_transform_sample() {
        let mut store = TestEnv::sample().store();
        let out = transform(&mut store).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.groups, 5);
        assert_eq!(summary.months, 3);
        assert_eq!(summary.rows_read, 11);
        assert_eq!(summary.rows_discarded, 2);
        assert_eq!(summary.first_month, Some("2024/01/01".parse().unwrap()));
        assert_eq!(summary.last_month, Some("2024/03/01".parse().unwrap()));

        let rows = store.rows(OPERATION).await.unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(
            rows[0],
            vec![
                Cell::from("item"),
                Cell::from("category"),
                Cell::from("2024/01/01"),
                Cell::from("2024/02/01"),
                Cell::from("2024/03/01"),
            ]
        );
        assert_eq!(
            rows[1],
            vec![
                Cell::from("BASE BREAD Chocolate"),
                Cell::from("BASE BREAD"),
                Cell::Number(5.0),
                Cell::Number(10.0),
                Cell::Number(10.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_transform_replaces_previous_output() {
        let mut store = TestEnv::sample()
            .replace(OPERATION, vec![vec!["stale"; 8]; 20])
            .store();
        transform(&mut store).await.unwrap();
        let rows = store.rows(OPERATION).await.unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.len() == 5));
    }

    #[tokio::test]
    async fn test_transform_is_idempotent() {
        let mut store = TestEnv::sample().store();
        transform(&mut store).await.unwrap();
        let first = store.rows(OPERATION).await.unwrap().to_vec();
        transform(&mut store).await.unwrap();
        assert_eq!(store.rows(OPERATION).await.unwrap(), first.as_slice());
    }

    #[tokio::test]
    async fn test_transform_missing_sink_has_no_side_effect() {
        let env = TestEnv::sample().without(OPERATION);
        let mut store = env.store();
        let data_before = store.rows(DATA).await.unwrap().to_vec();
        let err = transform(&mut store).await.unwrap_err();
        assert_eq!(
            rollup_error(&err),
            Some(&RollupError::missing_sink(OPERATION))
        );
        assert!(!store.has_table(OPERATION).await.unwrap());
        store.invalidate_all();
        assert_eq!(store.rows(DATA).await.unwrap(), data_before.as_slice());
    }

    #[tokio::test]
    async fn test_transform_failed_write_keeps_previous_output() {
        let previous = vec![vec![Cell::from("keep"), Cell::from("me")]];
        let shared = SharedWorkbook::new(MemoryWorkbook::sample().with_table(
            OPERATION,
            previous.clone(),
            None,
        ));
        let mut store = shared.failing_writes().store();
        assert!(transform(&mut store).await.is_err());
        assert_eq!(shared.table_rows(OPERATION).await, Some(previous));
    }

    #[tokio::test]
    async fn test_transform_empty_data_leaves_output_alone() {
        let mut store = TestEnv::with_data(vec![vec!["month", "category", "item", "quantity"]])
            .replace(OPERATION, vec![vec!["keep"]])
            .store();
        let err = transform(&mut store).await.unwrap_err();
        assert!(matches!(
            rollup_error(&err),
            Some(RollupError::EmptyInput(_))
        ));
        assert_eq!(
            store.rows(OPERATION).await.unwrap(),
            &[vec![Cell::from("keep")]]
        );
    }

    #[tokio::test]
    async fn test_transform_no_valid_rows() {
        let mut store = TestEnv::with_data(vec![
            vec!["month", "category", "item", "quantity"],
            vec!["2024/01/15", "Food", "Apple", "abc"],
        ])
        .store();
        let err = transform(&mut store).await.unwrap_err();
        assert!(matches!(
            rollup_error(&err),
            Some(RollupError::EmptyInput(_))
        ));
    }

    #[tokio::test]
    async fn test_transform_to_configured_sink() {
        let env = TestEnv::sample().replace("rollup", Vec::new());
        let mut tables = crate::config::Tables::default();
        tables.operation = "rollup".to_string();
        let mut store = TableStore::new(Box::new(env.workbook().clone()), tables);
        transform(&mut store).await.unwrap();
        assert_eq!(store.rows("rollup").await.unwrap().len(), 6);
        assert!(store.rows(OPERATION).await.unwrap().is_empty());
    }
}
