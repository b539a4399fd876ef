//! This module is responsible for the host read/write calls behind the store.
//!
//! A `Workbook` is a set of named rectangular tables with declared named regions. The rest of the
//! program only talks to the `Workbook` trait, so the same pipeline runs against a directory of
//! CSV files or an in-memory grid.

mod csv_dir;
mod memory;

use crate::model::{Cell, SchemaMapping};
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::env::VarError;
use tracing::debug;

pub use csv_dir::CsvWorkbook;
pub use memory::MemoryWorkbook;

/// Default name of the table holding the raw data rows.
pub const DATA: &str = "data";
/// Default name of the table that receives the rollup.
pub const OPERATION: &str = "operation";
/// Default name of the table holding category colors.
pub const CATEGORIES: &str = "categories";
/// Default name of the key/value table for chart settings.
pub const CONFIG: &str = "config";

/// The environment variable that switches the program into test mode.
const ROLLUP_IN_TEST_MODE: &str = "ROLLUP_IN_TEST_MODE";

/// The operations a workbook backend must provide. Rows and columns are 0-based here; named
/// regions are 1-based, the way a spreadsheet numbers its columns.
#[async_trait::async_trait]
pub trait Workbook {
    /// The names of the tables that exist.
    async fn tables(&mut self) -> Result<Vec<String>>;

    /// Every row of the table's occupied region, header included.
    ///
    /// # Errors
    /// - `RollupError::TableNotFound` if the table does not exist.
    async fn rows(&mut self, table: &str) -> Result<Vec<Vec<Cell>>>;

    /// The table's declared named regions, or `None` if it declares none.
    ///
    /// # Errors
    /// - `RollupError::TableNotFound` if the table does not exist.
    async fn named_columns(&mut self, table: &str) -> Result<Option<SchemaMapping>>;

    /// Removes all content from the table. The table and its named regions remain.
    async fn clear(&mut self, table: &str) -> Result<()>;

    /// Writes `rows` as a rectangle whose top-left cell is (`row`, `col`), growing the table as
    /// needed and overwriting whatever was in that footprint.
    ///
    /// # Errors
    /// - `RollupError::MissingSink` if the table does not exist.
    async fn write(&mut self, table: &str, row: usize, col: usize, rows: &[Vec<Cell>])
        -> Result<()>;

    /// Replaces the whole content of the table with `rows` in one step. On failure the table
    /// keeps its previous content.
    ///
    /// # Errors
    /// - `RollupError::MissingSink` if the table does not exist.
    async fn replace(&mut self, table: &str, rows: &[Vec<Cell>]) -> Result<()>;

    /// Whether the table exists.
    async fn has_table(&mut self, table: &str) -> Result<bool> {
        Ok(self.tables().await?.iter().any(|t| t == table))
    }
}

/// Selects which backend the program uses.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Read and write the CSV workbook named in the configuration.
    #[default]
    Csv,
    /// Use an in-memory workbook seeded with sample data. Nothing touches the disk.
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    /// Returns `Mode::Test` when `ROLLUP_IN_TEST_MODE` is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var(ROLLUP_IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            Ok(_) | Err(VarError::NotPresent) | Err(VarError::NotUnicode(_)) => Mode::Csv,
        }
    }
}

/// Creates the workbook backend for `mode`.
pub async fn workbook(config: &Config, mode: Mode) -> Result<Box<dyn Workbook + Send>> {
    debug!("Opening the workbook in {mode} mode");
    match mode {
        Mode::Csv => Ok(Box::new(CsvWorkbook::open(config.workbook_path()).await?)),
        Mode::Test => Ok(Box::new(MemoryWorkbook::default())),
    }
}
