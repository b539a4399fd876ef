//! Monthly rollup of item quantities.
//!
//! Rows of (month, category, item, quantity) are read from a workbook table, normalized,
//! grouped by item and category, and projected into a matrix of running totals with one column
//! per month. See `commands::transform` for the whole run.

mod api;
pub mod args;
pub mod chart;
pub mod colors;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod time;
mod utils;


pub use api::{
    workbook, CsvWorkbook, MemoryWorkbook, Mode, Workbook, CATEGORIES, CONFIG, DATA, OPERATION,
};
pub use config::{Config, Tables};
pub use error::{rollup_error, Error, Result, RollupError};
