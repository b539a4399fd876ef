use crate::model::{CanonicalMonth, Cell, Quantity};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Header of the item column in the rollup output.
pub const ITEM_HEADER: &str = "item";
/// Header of the category column in the rollup output.
pub const CATEGORY_HEADER: &str = "category";

/// The rollup output: one column per month in ascending order, one row per group holding the
/// running total up to and including each month.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputMatrix {
    months: Vec<CanonicalMonth>,
    rows: Vec<RollupRow>,
}

/// One group's row in the rollup output.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RollupRow {
    pub item: String,
    pub category: String,
    /// `cumulative[k]` is the sum of the group's quantities for `months[0..=k]`.
    pub cumulative: Vec<Quantity>,
}

impl OutputMatrix {
    pub(crate) fn new(months: Vec<CanonicalMonth>, rows: Vec<RollupRow>) -> Self {
        Self { months, rows }
    }

    pub fn months(&self) -> &[CanonicalMonth] {
        &self.months
    }

    pub fn rows(&self) -> &[RollupRow] {
        &self.rows
    }

    /// `["item", "category", "yyyy/MM/01", ...]`
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![ITEM_HEADER.to_string(), CATEGORY_HEADER.to_string()];
        header.extend(self.months.iter().map(|m| m.to_string()));
        header
    }

    /// Row-major cells, header first, ready to be written to a table starting at its origin.
    pub fn to_cells(&self) -> Vec<Vec<Cell>> {
        let mut cells = Vec::with_capacity(self.rows.len() + 1);
        cells.push(self.header().into_iter().map(Cell::Text).collect());
        for row in &self.rows {
            let mut out = Vec::with_capacity(row.cumulative.len() + 2);
            out.push(Cell::Text(row.item.clone()));
            out.push(Cell::Text(row.category.clone()));
            out.extend(row.cumulative.iter().map(|q| Cell::from(*q)));
            cells.push(out);
        }
        cells
    }

    /// Renders the matrix as CSV text, header first.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = vec![row.item.clone(), row.category.clone()];
            record.extend(row.cumulative.iter().map(|q| q.to_string()));
            writer.write_record(&record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush the CSV writer: {}", e.error()))?;
        String::from_utf8(bytes).context("The CSV output was not valid UTF-8")
    }
}
