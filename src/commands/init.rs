use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, an initial `config.json`, and a CSV workbook holding the data,
/// operation, categories and config tables with their header rows and named regions.
///
/// # Arguments
/// - `rollup_home` - The directory that will be the home directory, e.g. `$HOME/rollup`
/// - `workbook` - Where to create the workbook. Defaults to `$ROLLUP_HOME/workbook`.
///
/// # Errors
/// - Returns an error if any file operations fail or if the home is already initialized.
pub async fn init(rollup_home: &Path, workbook: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(rollup_home, workbook)
        .await
        .context("Unable to create the rollup home directory and config")?;
    Ok(format!(
        "Created the rollup home at {} with a workbook at {}",
        config.root().display(),
        config.workbook_path().display()
    )
    .into())
}
