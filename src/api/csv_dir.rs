//! Implements the `Workbook` trait over a directory of CSV files.
//!
//! Each table is stored as `<table>.csv` with no special header handling: the first line of the
//! file is simply the first row of the table. Named regions live in `workbook.json`:
//!
//! ```json
//! {
//!   "tables": {
//!     "data": { "DATA.MONTH": 1, "DATA.CATEGORY": 2, "DATA.ITEM": 3, "DATA.QUANTITY": 4 },
//!     "categories": { "CATEGORIES.CATEGORY": 1, "CATEGORIES.COLOR": 2 }
//!   }
//! }
//! ```

use crate::api::memory::write_rect;
use crate::api::{Workbook, CATEGORIES, CONFIG, DATA, OPERATION};
use crate::error::RollupError;
use crate::model::schema::{
    CATEGORIES_CATEGORY, CATEGORIES_COLOR, CONFIG_KEY, CONFIG_VALUE, DATA_CATEGORY, DATA_ITEM,
    DATA_MONTH, DATA_QUANTITY,
};
use crate::model::{Cell, SchemaMapping};
use crate::{utils, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// The name of the file that declares the named regions of each table.
pub const MANIFEST_JSON: &str = "workbook.json";
const CSV_EXTENSION: &str = "csv";

/// The serialization format of `workbook.json`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    tables: BTreeMap<String, SchemaMapping>,
}

/// A workbook stored as a directory of CSV files plus a `workbook.json` manifest.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
    manifest: Manifest,
}

impl CsvWorkbook {
    /// Opens an existing workbook directory. A missing manifest means that no table declares
    /// named regions.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        let dir = utils::canonicalize(&maybe_relative)
            .await
            .context("The workbook directory is missing")?;
        let manifest_path = dir.join(MANIFEST_JSON);
        let manifest = if manifest_path.is_file() {
            utils::deserialize(&manifest_path).await?
        } else {
            debug!("No {MANIFEST_JSON} in {}", dir.display());
            Manifest::default()
        };
        Ok(Self { dir, manifest })
    }

    /// Creates a workbook directory holding the four standard tables with their header rows and
    /// named regions. Tables that already exist are left alone, as is an existing manifest.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the workbook directory")?;
        let dir = utils::canonicalize(&maybe_relative).await?;

        let mut manifest = Manifest::default();
        for (table, header, named) in standard_tables()? {
            let path = table_path(&dir, table);
            if path.is_file() {
                debug!("Keeping the existing table {}", path.display());
            } else {
                let rows: Vec<Vec<Cell>> = if header.is_empty() {
                    Vec::new()
                } else {
                    vec![header.iter().map(|h| Cell::from(*h)).collect()]
                };
                utils::write_replace(&path, to_csv(&rows)?).await?;
            }
            if let Some(named) = named {
                manifest.tables.insert(table.to_string(), named);
            }
        }

        let manifest_path = dir.join(MANIFEST_JSON);
        if manifest_path.is_file() {
            manifest = utils::deserialize(&manifest_path).await?;
        } else {
            let json = serde_json::to_string_pretty(&manifest)
                .context("Unable to serialize the workbook manifest")?;
            utils::write(&manifest_path, json).await?;
        }
        Ok(Self { dir, manifest })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path of `table`, if the table exists.
    fn existing(&self, table: &str) -> Option<PathBuf> {
        if table.is_empty() || table.starts_with('.') || table.contains(['/', '\\']) {
            return None;
        }
        let path = table_path(&self.dir, table);
        path.is_file().then_some(path)
    }

    async fn read_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
        let content = utils::read(path).await?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record =
                result.with_context(|| format!("Unable to parse CSV in {}", path.display()))?;
            rows.push(record.iter().map(Cell::text).collect());
        }
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl Workbook for CsvWorkbook {
    async fn tables(&mut self) -> Result<Vec<String>> {
        let tables = utils::read_dir(&self.dir)
            .await?
            .into_iter()
            .filter(|p| p.is_file())
            .filter(|p| p.extension().is_some_and(|e| e == CSV_EXTENSION))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .filter(|name| !name.starts_with('.'))
            .collect();
        Ok(tables)
    }

    async fn rows(&mut self, table: &str) -> Result<Vec<Vec<Cell>>> {
        let path = self
            .existing(table)
            .ok_or_else(|| RollupError::table_not_found(table))?;
        trace!("Reading {}", path.display());
        Self::read_rows(&path).await
    }

    async fn named_columns(&mut self, table: &str) -> Result<Option<SchemaMapping>> {
        if self.existing(table).is_none() {
            return Err(RollupError::table_not_found(table).into());
        }
        Ok(self
            .manifest
            .tables
            .get(table)
            .filter(|named| !named.is_empty())
            .cloned())
    }

    async fn clear(&mut self, table: &str) -> Result<()> {
        if let Some(path) = self.existing(table) {
            trace!("Clearing {}", path.display());
            utils::write_replace(&path, "").await?;
        }
        Ok(())
    }

    async fn write(
        &mut self,
        table: &str,
        row: usize,
        col: usize,
        rows: &[Vec<Cell>],
    ) -> Result<()> {
        let path = self
            .existing(table)
            .ok_or_else(|| RollupError::missing_sink(table))?;
        let mut grid = Self::read_rows(&path).await?;
        write_rect(&mut grid, row, col, rows);
        trace!("Writing {} rows to {}", grid.len(), path.display());
        utils::write_replace(&path, to_csv(&grid)?).await
    }

    async fn replace(&mut self, table: &str, rows: &[Vec<Cell>]) -> Result<()> {
        let path = self
            .existing(table)
            .ok_or_else(|| RollupError::missing_sink(table))?;
        trace!("Replacing {} with {} rows", path.display(), rows.len());
        utils::write_replace(&path, to_csv(rows)?).await
    }
}

fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.{CSV_EXTENSION}"))
}

/// Serializes `rows` as CSV. Short rows are padded so that every line has the same number of
/// fields.
fn to_csv(rows: &[Vec<Cell>]) -> Result<Vec<u8>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Ok(Vec::new());
    }
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        let fields = (0..width).map(|ix| row.get(ix).map(Cell::to_string).unwrap_or_default());
        wtr.write_record(fields).context("Unable to write a CSV record")?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("Unable to flush CSV data: {}", e.error()))
}

type TableTemplate = (&'static str, Vec<&'static str>, Option<SchemaMapping>);

/// The tables `create` writes: name, header row and named regions.
fn standard_tables() -> Result<Vec<TableTemplate>> {
    Ok(vec![
        (
            DATA,
            vec!["month", "category", "item", "quantity"],
            Some(SchemaMapping::new(vec![
                (DATA_MONTH, 1),
                (DATA_CATEGORY, 2),
                (DATA_ITEM, 3),
                (DATA_QUANTITY, 4),
            ])?),
        ),
        (OPERATION, Vec::new(), None),
        (
            CATEGORIES,
            vec!["category", "color"],
            Some(SchemaMapping::new(vec![
                (CATEGORIES_CATEGORY, 1),
                (CATEGORIES_COLOR, 2),
            ])?),
        ),
        (
            CONFIG,
            Vec::new(),
            Some(SchemaMapping::new(vec![(CONFIG_KEY, 1), (CONFIG_VALUE, 2)])?),
        ),
    ])
}
