//! Error types for the data table and the project store.

use thiserror::Error;
use crate::types::{CellId, SeriesId};

/// Result type alias for table and store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the data model or the record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store has no open project file
    #[error("No project file is open")]
    NotOpen,

    /// The project file header is malformed
    #[error("Invalid project file: {0}")]
    InvalidProjectFile(String),

    /// A cell chain violates its linkage or index invariants
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Invalid operation for the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Cell handle does not refer to a live cell
    #[error("Cell {0} not found")]
    CellNotFound(CellId),

    /// Series handle does not refer to a live series
    #[error("Series {0} not found")]
    SeriesNotFound(SeriesId),

    /// Operation needs the cell to be linked into a series
    #[error("Cell {0} is not attached to a series")]
    CellNotAttached(CellId),

    /// `swap_with_next` was called on the last cell of a series
    #[error("No cell after {0}")]
    NoSuccessor(CellId),

    /// Cell text is not a number in the configured locale
    #[error("Invalid number format: {0:?}")]
    NumberFormat(String),

    /// Row index past the end of the table
    #[error("Row {row} out of bounds (rows: {rows})")]
    RowOutOfBounds { row: usize, rows: usize },
}

impl StoreError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create an invalid project file error
    pub fn invalid_file(msg: impl Into<String>) -> Self {
        Self::InvalidProjectFile(msg.into())
    }
}
