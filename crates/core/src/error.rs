//! Data error model.

use thiserror::Error;

/// Result type used when building or validating a [`crate::Dataset`].
pub type DataResult<T> = Result<T, DataError>;

/// Structural problem with a dataset.
///
/// These are the only fatal failures of an analysis: everything that can go
/// wrong inside a single column is handled (and omitted) by the analyzers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The dataset has no columns at all.
    #[error("dataset has no columns")]
    NoColumns,

    /// The dataset has columns but no rows.
    #[error("dataset has no rows")]
    NoRows,

    /// A row does not carry exactly one value per column.
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Two columns share the same name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
}
