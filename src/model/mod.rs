//! Types that represent the core data model, such as `RawRecord`, `CanonicalMonth` and
//! `OutputMatrix`.
mod cell;
mod matrix;
mod month;
mod quantity;
mod record;
pub mod schema;

pub use cell::Cell;
pub use matrix::{OutputMatrix, RollupRow, CATEGORY_HEADER, ITEM_HEADER};
pub use month::CanonicalMonth;
pub use quantity::{Quantity, QuantityError};
pub use record::{AggregationEntry, GroupKey, NormalizedRecord, RawRecord};
pub use schema::{SchemaError, SchemaMapping};
