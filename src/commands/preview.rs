use crate::commands::Out;
use crate::model::OutputMatrix;
use crate::pipeline;
use crate::store::TableStore;
use crate::Result;

/// Runs the rollup over the data table without writing anything.
///
/// # Errors
/// - `RollupError::EmptyInput` when there are no data rows or none of them is valid.
pub async fn preview(store: &mut TableStore) -> Result<Out<OutputMatrix>> {
    let records = store.data_records().await?;
    let rollup = pipeline::transform(&records)?;
    Ok(Out::new(
        format!(
            "Rolled up {} of {} data rows into {} groups",
            rollup.rows_read - rollup.rows_discarded,
            rollup.rows_read,
            rollup.matrix.rows().len()
        ),
        rollup.matrix,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OPERATION;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let mut store = TestEnv::sample().store();
        let out = preview(&mut store).await.unwrap();
        let matrix = out.structure().unwrap();
        assert_eq!(matrix.rows().len(), 5);
        assert_eq!(out.message(), "Rolled up 9 of 11 data rows into 5 groups");
        assert!(store.rows(OPERATION).await.unwrap().is_empty());
    }
}
