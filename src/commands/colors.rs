use crate::colors::CategoryColors;
use crate::commands::Out;
use crate::store::TableStore;
use crate::Result;

/// Reads the display color of each category from the categories table.
pub async fn colors(store: &mut TableStore) -> Result<Out<CategoryColors>> {
    let colors = store.category_colors().await?;
    Ok(Out::new(
        format!("Found colors for {} categories", colors.len()),
        colors,
    ))
}
