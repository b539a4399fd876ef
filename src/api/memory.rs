//! Implements the `Workbook` trait using in-memory tables.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a workbook on disk.

use crate::api::{Workbook, CATEGORIES, CONFIG, DATA, OPERATION};
use crate::error::RollupError;
use crate::model::schema::{
    CATEGORIES_CATEGORY, CATEGORIES_COLOR, CONFIG_KEY, CONFIG_VALUE, DATA_CATEGORY, DATA_ITEM,
    DATA_MONTH, DATA_QUANTITY,
};
use crate::model::{Cell, SchemaMapping};
use crate::Result;
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::trace;

/// One table held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryTable {
    rows: Vec<Vec<Cell>>,
    named_columns: Option<SchemaMapping>,
}

/// An implementation of the `Workbook` trait that holds its tables in memory. By default, it is
/// seeded with a small sample workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryWorkbook {
    tables: BTreeMap<String, MemoryTable>,
}

impl MemoryWorkbook {
    /// Create a workbook with no tables.
    pub fn empty() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a table.
    pub fn with_table(
        mut self,
        name: impl Into<String>,
        rows: Vec<Vec<Cell>>,
        named_columns: Option<SchemaMapping>,
    ) -> Self {
        self.tables.insert(
            name.into(),
            MemoryTable {
                rows,
                named_columns,
            },
        );
        self
    }

    /// Removes a table, if it exists.
    pub fn without_table(mut self, name: &str) -> Self {
        self.tables.remove(name);
        self
    }

    /// The current rows of `table`, if it exists.
    pub fn table_rows(&self, table: &str) -> Option<&[Vec<Cell>]> {
        self.tables.get(table).map(|t| t.rows.as_slice())
    }

    fn table(&self, table: &str) -> Result<&MemoryTable> {
        self.tables
            .get(table)
            .ok_or_else(|| RollupError::table_not_found(table).into())
    }
}

#[async_trait::async_trait]
impl Workbook for MemoryWorkbook {
    async fn tables(&mut self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn rows(&mut self, table: &str) -> Result<Vec<Vec<Cell>>> {
        trace!("rows for {table}");
        Ok(self.table(table)?.rows.clone())
    }

    async fn named_columns(&mut self, table: &str) -> Result<Option<SchemaMapping>> {
        Ok(self.table(table)?.named_columns.clone())
    }

    async fn clear(&mut self, table: &str) -> Result<()> {
        trace!("clear {table}");
        if let Some(t) = self.tables.get_mut(table) {
            t.rows.clear();
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
        trace!("write {} rows to {table} at ({row}, {col})", rows.len());
        let t = self
            .tables
            .get_mut(table)
            .ok_or_else(|| RollupError::missing_sink(table))?;
        write_rect(&mut t.rows, row, col, rows);
        Ok(())
    }

    async fn replace(&mut self, table: &str, rows: &[Vec<Cell>]) -> Result<()> {
        trace!("replace {table} with {} rows", rows.len());
        let t = self
            .tables
            .get_mut(table)
            .ok_or_else(|| RollupError::missing_sink(table))?;
        t.rows = rows.to_vec();
        Ok(())
    }
}

/// Writes `values` into `grid` with its top-left corner at (`row`, `col`), padding the grid with
/// empty cells where it is too small.
pub(super) fn write_rect(grid: &mut Vec<Vec<Cell>>, row: usize, col: usize, values: &[Vec<Cell>]) {
    if grid.len() < row + values.len() {
        grid.resize_with(row + values.len(), Vec::new);
    }
    for (ix, values_row) in values.iter().enumerate() {
        let target = &mut grid[row + ix];
        if target.len() < col + values_row.len() {
            target.resize(col + values_row.len(), Cell::Empty);
        }
        for (jx, value) in values_row.iter().enumerate() {
            target[col + jx] = value.clone();
        }
    }
}

/// Provides the seed workbook from this module.
fn default_tables() -> BTreeMap<String, MemoryTable> {
    let mut map = BTreeMap::new();
    // The data table's columns are deliberately not in logical order; the named regions find them.
    let data = MemoryTable {
        rows: load_csv(DATA_CSV),
        named_columns: SchemaMapping::new(vec![
            (DATA_ITEM, 1),
            (DATA_MONTH, 2),
            (DATA_QUANTITY, 3),
            (DATA_CATEGORY, 4),
        ])
        .ok(),
    };
    map.insert(DATA.to_string(), data);
    let categories = MemoryTable {
        rows: load_csv(CATEGORY_CSV),
        named_columns: SchemaMapping::new(vec![(CATEGORIES_CATEGORY, 1), (CATEGORIES_COLOR, 2)])
            .ok(),
    };
    map.insert(CATEGORIES.to_string(), categories);
    let config = MemoryTable {
        rows: load_csv(CONFIG_CSV),
        named_columns: SchemaMapping::new(vec![(CONFIG_KEY, 1), (CONFIG_VALUE, 2)]).ok(),
    };
    map.insert(CONFIG.to_string(), config);
    map.insert(OPERATION.to_string(), MemoryTable::default());
    map
}

impl MemoryWorkbook {
    /// A workbook seeded with the sample data from this module.
    pub fn sample() -> Self {
        Self {
            tables: default_tables(),
        }
    }
}

impl Default for MemoryWorkbook {
    fn default() -> Self {
        Self::sample()
    }
}

/// Loads cells from a CSV-formatted string. Every field becomes a text cell.
fn load_csv(csv_data: &str) -> Vec<Vec<Cell>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    rdr.records()
        .filter_map(|result| result.ok())
        .map(|record| record.iter().map(Cell::text).collect())
        .collect()
}

/// Seed data rows: item, month, quantity, category.
const DATA_CSV: &str = r##"item,month,quantity,category
BASE BREAD Chocolate,2024/01/15,3,BASE BREAD
BASE BREAD Chocolate,2024/01/28,2,BASE BREAD
BASE Cookies Cocoa,2024/01/20,4,BASE Cookies
BASE PASTA Fettuccine,2024/02/03,1,BASE PASTA
BASE BREAD Chocolate,2024/02/11,5,BASE BREAD
BASE YAKISOBA Sauce,2024/02/14,2,BASE YAKISOBA
BASE Cookies Cocoa,2024/03/02,6,BASE Cookies
Protein Bar,2024/03/09,3,Others
BASE PASTA Fettuccine,2024/03/21,2,BASE PASTA
BASE YAKISOBA Sauce,2024/03/30,n/a,BASE YAKISOBA
,2024/03/31,1,Others
"##;

/// Seed category colors.
const CATEGORY_CSV: &str = r##"category,color
BASE BREAD,#ff6b6b
BASE Cookies,#4ecdc4
BASE PASTA,#ffe66d
BASE YAKISOBA,#ff9f43
Others,#95a5a6
"##;

/// Seed chart settings. This table has no header row.
const CONFIG_CSV: &str = r##"startDate,2022/01/01
endDate,2025/01/01
frameDelay,100
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_tables() {
        let mut workbook = MemoryWorkbook::sample();
        let tables = workbook.tables().await.unwrap();
        assert_eq!(tables, vec![CATEGORIES, CONFIG, DATA, OPERATION]);
        let data = workbook.rows(DATA).await.unwrap();
        assert_eq!(data[0][0], Cell::from("item"));
        assert_eq!(data.len(), 12);
        let named = workbook.named_columns(DATA).await.unwrap().unwrap();
        assert_eq!(named.column(DATA_MONTH), Some(2));
        assert!(workbook.named_columns(OPERATION).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_default_is_the_sample() {
        assert_eq!(MemoryWorkbook::default(), MemoryWorkbook::sample());
    }

    #[tokio::test]
    async fn test_missing_table() {
        let mut workbook = MemoryWorkbook::empty();
        let err = workbook.rows("nope").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RollupError>(),
            Some(&RollupError::table_not_found("nope"))
        );
        assert!(!workbook.has_table("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_to_missing_table() {
        let mut workbook = MemoryWorkbook::empty();
        let err = workbook
            .write("out", 0, 0, &[vec![Cell::from("x")]])
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RollupError>(),
            Some(&RollupError::missing_sink("out"))
        );
        assert!(workbook.table_rows("out").is_none());
    }

    #[tokio::test]
    async fn test_write_overwrites_footprint_only() {
        let mut workbook = MemoryWorkbook::empty().with_table(
            "out",
            vec![
                vec![Cell::from("a"), Cell::from("b"), Cell::from("c")],
                vec![Cell::from("d"), Cell::from("e"), Cell::from("f")],
            ],
            None,
        );
        workbook
            .write("out", 0, 0, &[vec![Cell::from("x"), Cell::from("y")]])
            .await
            .unwrap();
        let rows = workbook.table_rows("out").unwrap();
        assert_eq!(rows[0], vec![Cell::from("x"), Cell::from("y"), Cell::from("c")]);
        assert_eq!(rows[1][0], Cell::from("d"));
    }

    #[tokio::test]
    async fn test_replace() {
        let mut workbook = MemoryWorkbook::empty().with_table(
            "out",
            vec![vec![Cell::from("a"), Cell::from("b")]; 3],
            None,
        );
        workbook
            .replace("out", &[vec![Cell::from("x")]])
            .await
            .unwrap();
        assert_eq!(
            workbook.table_rows("out").unwrap(),
            &[vec![Cell::from("x")]]
        );
        let err = workbook.replace("nope", &[]).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RollupError>(),
            Some(&RollupError::missing_sink("nope"))
        );
    }

    #[tokio::test]
    async fn test_write_grows_the_table() {
        let mut workbook = MemoryWorkbook::empty().with_table("out", Vec::new(), None);
        workbook
            .write("out", 1, 2, &[vec![Cell::Number(1.0)]])
            .await
            .unwrap();
        let rows = workbook.table_rows("out").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], vec![Cell::Empty, Cell::Empty, Cell::Number(1.0)]);
    }

    #[tokio::test]
    async fn test_clear_keeps_named_columns() {
        let mut workbook = MemoryWorkbook::sample();
        workbook.clear(CATEGORIES).await.unwrap();
        assert!(workbook.rows(CATEGORIES).await.unwrap().is_empty());
        assert!(workbook.named_columns(CATEGORIES).await.unwrap().is_some());
    }
}
