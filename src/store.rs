//! The tabular store: typed reads and writes over a `Workbook`, with an explicit cache.
//!
//! Reads are cached per table until a write or clear of that table. Schemas are cached until
//! `invalidate_all`, since writing cells does not change a table's declared named regions.

use crate::api::Workbook;
use crate::colors::CategoryColors;
use crate::config::Tables;
use crate::error::{rollup_error, RollupError};
use crate::model::schema::{
    CATEGORIES_CATEGORY, CATEGORIES_COLOR, CATEGORY_FIELDS, CONFIG_KEY, CONFIG_VALUE, DATA_CATEGORY,
    DATA_FIELDS, DATA_ITEM, DATA_MONTH, DATA_QUANTITY,
};
use crate::model::{Cell, RawRecord, SchemaMapping};
use crate::{time, Result};
use anyhow::bail;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Everything the store remembers between calls.
#[derive(Debug, Clone, Default)]
pub struct StoreCache {
    schemas: HashMap<String, Option<SchemaMapping>>,
    rows: HashMap<String, Vec<Vec<Cell>>>,
    colors: Option<CategoryColors>,
    config: Option<BTreeMap<String, Cell>>,
}

impl StoreCache {
    /// Drops what was read from `table` along with anything derived from it.
    fn invalidate(&mut self, table: &str, tables: &Tables) {
        if self.rows.remove(table).is_some() {
            debug!("Invalidated the cached rows of '{table}'");
        }
        if table == tables.categories {
            self.colors = None;
        }
        if table == tables.config {
            self.config = None;
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether rows of `table` are cached.
    pub fn has_rows(&self, table: &str) -> bool {
        self.rows.contains_key(table)
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn has_config(&self) -> bool {
        self.config.is_some()
    }
}

/// Reads typed rows from, and writes rows to, the tables of a workbook.
pub struct TableStore {
    workbook: Box<dyn Workbook + Send>,
    tables: Tables,
    cache: StoreCache,
}

impl TableStore {
    pub fn new(workbook: Box<dyn Workbook + Send>, tables: Tables) -> Self {
        Self {
            workbook,
            tables,
            cache: StoreCache::default(),
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn cache(&self) -> &StoreCache {
        &self.cache
    }

    /// The named regions `table` declares, or `None` if it declares none.
    ///
    /// # Errors
    /// - `RollupError::TableNotFound` if the table does not exist.
    pub async fn schema(&mut self, table: &str) -> Result<Option<SchemaMapping>> {
        if let Some(schema) = self.cache.schemas.get(table) {
            return Ok(schema.clone());
        }
        let schema = self.workbook.named_columns(table).await?;
        self.cache
            .schemas
            .insert(table.to_string(), schema.clone());
        Ok(schema)
    }

    /// Every row of `table`, header included.
    ///
    /// # Errors
    /// - `RollupError::TableNotFound` if the table does not exist.
    pub async fn rows(&mut self, table: &str) -> Result<&[Vec<Cell>]> {
        if self.cache.rows.contains_key(table) {
            debug!("Using the cached rows of '{table}'");
        } else {
            let rows = self.workbook.rows(table).await?;
            debug!("Read {} rows from '{table}'", rows.len());
            self.cache.rows.insert(table.to_string(), rows);
        }
        Ok(self
            .cache
            .rows
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub async fn has_table(&mut self, table: &str) -> Result<bool> {
        self.workbook.has_table(table).await
    }

    /// The data rows with their logical fields picked out through the data table's schema. The
    /// header row and rows whose month cell is empty are skipped. A missing data table yields no
    /// records.
    pub async fn data_records(&mut self) -> Result<Vec<RawRecord>> {
        let table = self.tables.data.clone();
        let Some(schema) = self.resolve_schema(&table, &DATA_FIELDS).await? else {
            debug!("The data table '{table}' does not exist");
            return Ok(Vec::new());
        };
        let month = schema.offset(DATA_MONTH);
        let records = self
            .rows(&table)
            .await?
            .iter()
            .skip(1)
            .filter(|row| !first_field_is_blank(row, month))
            .map(|row| RawRecord {
                month: field(row, &schema, DATA_MONTH),
                category: field(row, &schema, DATA_CATEGORY),
                item: field(row, &schema, DATA_ITEM),
                quantity: field(row, &schema, DATA_QUANTITY),
            })
            .collect();
        Ok(records)
    }

    /// The `(category, color)` rows of the categories table as text. A missing color is an empty
    /// string. A missing categories table yields no rows.
    pub async fn category_rows(&mut self) -> Result<Vec<(String, String)>> {
        let table = self.tables.categories.clone();
        let Some(schema) = self.resolve_schema(&table, &CATEGORY_FIELDS).await? else {
            debug!("The categories table '{table}' does not exist");
            return Ok(Vec::new());
        };
        let category = schema.offset(CATEGORIES_CATEGORY);
        let rows = self
            .rows(&table)
            .await?
            .iter()
            .skip(1)
            .filter(|row| !first_field_is_blank(row, category))
            .map(|row| {
                (
                    text(field(row, &schema, CATEGORIES_CATEGORY)),
                    text(field(row, &schema, CATEGORIES_COLOR)),
                )
            })
            .collect();
        Ok(rows)
    }

    /// The category colors, computed once and then served from the cache until the categories
    /// table is written.
    pub async fn category_colors(&mut self) -> Result<CategoryColors> {
        if let Some(colors) = &self.cache.colors {
            debug!("Using the cached category colors");
            return Ok(colors.clone());
        }
        let colors = CategoryColors::from_rows(self.category_rows().await?);
        self.cache.colors = Some(colors.clone());
        Ok(colors)
    }

    /// The key/value pairs of the config table. The table has no header row. Without named
    /// regions, the key is in column 1 and the value in column 2. Rows with an empty key are
    /// skipped and date values become ISO-8601 strings. A missing config table yields no values.
    pub async fn config_values(&mut self) -> Result<BTreeMap<String, Cell>> {
        if let Some(values) = &self.cache.config {
            debug!("Using the cached config values");
            return Ok(values.clone());
        }
        let table = self.tables.config.clone();
        let schema = match self.schema(&table).await {
            Ok(Some(schema)) => schema,
            Ok(None) => SchemaMapping::new(vec![(CONFIG_KEY, 1), (CONFIG_VALUE, 2)])?,
            Err(e) if is_table_not_found(&e) => {
                debug!("The config table '{table}' does not exist");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e),
        };
        let values: BTreeMap<String, Cell> = self
            .rows(&table)
            .await?
            .iter()
            .filter_map(|row| {
                let key = field(row, &schema, CONFIG_KEY).filter(|k| !k.is_blank())?;
                let key = key.to_string().trim().to_string();
                let value = field(row, &schema, CONFIG_VALUE)
                    .unwrap_or_default()
                    .with_iso_dates();
                Some((key, value))
            })
            .collect();
        self.cache.config = Some(values.clone());
        Ok(values)
    }

    /// The operation table with date cells rendered as `yyyy/MM/dd` in the reference time zone.
    ///
    /// # Errors
    /// - `RollupError::TableNotFound` if the operation table does not exist.
    pub async fn operation_rows_formatted(&mut self) -> Result<Vec<Vec<Cell>>> {
        let table = self.tables.operation.clone();
        let rows = self
            .rows(&table)
            .await?
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Date(d) => Cell::Text(time::format_ymd(d)),
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    /// Removes all content from `table`.
    pub async fn clear(&mut self, table: &str) -> Result<()> {
        let result = self.workbook.clear(table).await;
        self.cache.invalidate(table, &self.tables);
        result
    }

    /// Writes `rows` starting at the first cell of `table`. Every row must have as many cells as
    /// the first one. Writing no rows does nothing.
    ///
    /// # Errors
    /// - `RollupError::MissingSink` if the table does not exist.
    pub async fn write(&mut self, table: &str, rows: &[Vec<Cell>]) -> Result<()> {
        if rows.is_empty() {
            debug!("Nothing to write to '{table}'");
            return Ok(());
        }
        check_rectangular(table, rows)?;
        let result = self.workbook.write(table, 0, 0, rows).await;
        self.cache.invalidate(table, &self.tables);
        result
    }

    /// Replaces the content of `table` with `rows` in one step: either the table holds exactly
    /// `rows` afterwards or it keeps what it had. Every row must have as many cells as the first.
    ///
    /// # Errors
    /// - `RollupError::MissingSink` if the table does not exist.
    pub async fn replace(&mut self, table: &str, rows: &[Vec<Cell>]) -> Result<()> {
        check_rectangular(table, rows)?;
        let result = self.workbook.replace(table, rows).await;
        self.cache.invalidate(table, &self.tables);
        result
    }

    /// Forgets everything that has been read.
    pub fn invalidate_all(&mut self) {
        debug!("Invalidating all cached tables");
        self.cache.clear();
    }

    /// The schema of `table`: its named regions, or else the positions of `fields` in its header
    /// row. `None` when the table does not exist.
    async fn resolve_schema(
        &mut self,
        table: &str,
        fields: &[(&str, &str)],
    ) -> Result<Option<SchemaMapping>> {
        match self.schema(table).await {
            Ok(Some(schema)) => Ok(Some(schema)),
            Ok(None) => {
                let headers: Vec<String> = self
                    .rows(table)
                    .await?
                    .first()
                    .map(|row| row.iter().map(Cell::to_string).collect())
                    .unwrap_or_default();
                debug!("'{table}' declares no named regions, using its header row");
                Ok(Some(SchemaMapping::from_headers(&headers, fields)))
            }
            Err(e) if is_table_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Fails when the rows of `rows` do not all have the width of the first one.
fn check_rectangular(table: &str, rows: &[Vec<Cell>]) -> Result<()> {
    let width = rows.first().map(Vec::len).unwrap_or_default();
    if let Some((ix, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        bail!(
            "Row {ix} has {} cells but the first row has {width}, refusing to write '{table}'",
            row.len()
        );
    }
    Ok(())
}

fn is_table_not_found(e: &crate::Error) -> bool {
    matches!(rollup_error(e), Some(RollupError::TableNotFound { .. }))
}

/// The cell that holds `name` in `row`. `None` when the schema does not locate the field or the
/// row is too short to reach it.
fn field(row: &[Cell], schema: &SchemaMapping, name: &str) -> Option<Cell> {
    schema
        .offset(name)
        .and_then(|offset| row.get(offset))
        .cloned()
}

/// Whether the row's first logical field is empty. A row is never skipped on this basis when
/// the field is not located at all.
fn first_field_is_blank(row: &[Cell], offset: Option<usize>) -> bool {
    match offset {
        Some(offset) => row.get(offset).map_or(true, Cell::is_blank),
        None => false,
    }
}

fn text(cell: Option<Cell>) -> String {
    cell.map(|c| c.to_string()).unwrap_or_default()
}
