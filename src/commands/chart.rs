use crate::chart::ChartData;
use crate::commands::Out;
use crate::store::TableStore;
use crate::Result;

/// Gathers what a chart view needs: the operation table with dates formatted as `yyyy/MM/dd`,
/// the config table's settings, and the category colors.
///
/// # Errors
/// - `RollupError::TableNotFound` when the operation table does not exist.
pub async fn chart_data(store: &mut TableStore) -> Result<Out<ChartData>> {
    let sheet_data = store.operation_rows_formatted().await?;
    let config = store.config_values().await?;
    let category_colors = store.category_colors().await?;
    let chart = ChartData::new(config, sheet_data, category_colors);
    Ok(Out::new(
        format!(
            "Chart data has {} rows and {} categories",
            chart.sheet_data.len().saturating_sub(1),
            chart.category_colors.len()
        ),
        chart,
    ))
}
