//! The payload a chart view consumes: the rollup table, chart settings and category colors.

use crate::colors::CategoryColors;
use crate::model::Cell;
use serde::Serialize;
use std::collections::BTreeMap;

/// Config key of the first month shown by the chart.
pub const START_DATE: &str = "startDate";
/// Config key of the last month shown by the chart.
pub const END_DATE: &str = "endDate";

/// Everything a chart needs in one structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Chart settings from the config table, with the date range taken from `sheet_data`.
    pub config: BTreeMap<String, Cell>,
    /// The operation table, dates rendered as `yyyy/MM/dd`.
    pub sheet_data: Vec<Vec<Cell>>,
    /// Display color of each category.
    pub category_colors: CategoryColors,
}

impl ChartData {
    /// Assembles the payload. When `sheet_data` has at least one row below its header and the
    /// header has `yyyy/MM/dd` columns, the first and last of those replace the configured
    /// `startDate` and `endDate`.
    pub fn new(
        mut config: BTreeMap<String, Cell>,
        sheet_data: Vec<Vec<Cell>>,
        category_colors: CategoryColors,
    ) -> Self {
        if let Some((start, end)) = date_range(&sheet_data) {
            config.insert(START_DATE.to_string(), Cell::Text(start));
            config.insert(END_DATE.to_string(), Cell::Text(end));
        }
        Self {
            config,
            sheet_data,
            category_colors,
        }
    }

    pub fn start_date(&self) -> Option<&Cell> {
        self.config.get(START_DATE)
    }

    pub fn end_date(&self) -> Option<&Cell> {
        self.config.get(END_DATE)
    }
}

/// The smallest and largest `yyyy/MM/dd` header columns, compared as text.
fn date_range(sheet_data: &[Vec<Cell>]) -> Option<(String, String)> {
    if sheet_data.len() < 2 {
        return None;
    }
    let mut dates: Vec<String> = sheet_data[0]
        .iter()
        .map(Cell::to_string)
        .filter(|h| is_date_key(h))
        .collect();
    dates.sort();
    let start = dates.first()?.clone();
    let end = dates.last()?.clone();
    Some((start, end))
}

/// Whether `s` looks like `yyyy/MM/dd`.
fn is_date_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(ix, b)| match ix {
            4 | 7 => *b == b'/',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|c| Cell::from(*c)).collect()
    }

    fn configured() -> BTreeMap<String, Cell> {
        let mut config = BTreeMap::new();
        config.insert(START_DATE.to_string(), Cell::from("2022/01/01"));
        config.insert(END_DATE.to_string(), Cell::from("2025/01/01"));
        config.insert("frameDelay".to_string(), Cell::Number(100.0));
        config
    }

    #[test]
    fn test_range_from_header() {
        let sheet_data = vec![
            row(&["item", "category", "2024/03/01", "2024/01/01", "2024/02/01"]),
            row(&["Apple", "Food", "1", "2", "3"]),
        ];
        let chart = ChartData::new(configured(), sheet_data, CategoryColors::default());
        assert_eq!(chart.start_date(), Some(&Cell::from("2024/01/01")));
        assert_eq!(chart.end_date(), Some(&Cell::from("2024/03/01")));
        assert_eq!(chart.config.get("frameDelay"), Some(&Cell::Number(100.0)));
    }

    #[test]
    fn test_header_only_keeps_config() {
        let sheet_data = vec![row(&["item", "category", "2024/03/01"])];
        let chart = ChartData::new(configured(), sheet_data, CategoryColors::default());
        assert_eq!(chart.start_date(), Some(&Cell::from("2022/01/01")));
    }

    #[test]
    fn test_no_date_columns_keeps_config() {
        let sheet_data = vec![row(&["item", "category"]), row(&["Apple", "Food"])];
        let chart = ChartData::new(configured(), sheet_data, CategoryColors::default());
        assert_eq!(chart.end_date(), Some(&Cell::from("2025/01/01")));
    }

    #[test]
    fn test_is_date_key() {
        assert!(is_date_key("2024/01/01"));
        assert!(!is_date_key("2024-01-01"));
        assert!(!is_date_key("2024/1/01"));
        assert!(!is_date_key("category"));
    }

    #[test]
    fn test_serialized_field_names() {
        let chart = ChartData::new(BTreeMap::new(), Vec::new(), CategoryColors::default());
        let json = serde_json::to_string(&chart).unwrap();
        assert_eq!(json, r#"{"config":{},"sheetData":[],"categoryColors":{}}"#);
    }
}
