pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The failures that abort a rollup run and that callers may need to tell apart. These travel
/// inside an `anyhow::Error`; use `downcast_ref::<RollupError>()` to inspect them.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RollupError {
    /// The source table yielded no rows, or no row survived normalization.
    #[error("{0}")]
    EmptyInput(String),

    /// The output table that should receive the rollup does not exist.
    #[error("Sheet not found: {table}")]
    MissingSink { table: String },

    /// A table that was expected to be readable does not exist.
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },
}

impl RollupError {
    pub(crate) fn missing_sink(table: impl Into<String>) -> Self {
        Self::MissingSink {
            table: table.into(),
        }
    }

    pub(crate) fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }
}

/// Returns the `RollupError` carried by `e`, if any.
pub fn rollup_error(e: &Error) -> Option<&RollupError> {
    e.downcast_ref::<RollupError>()
}
