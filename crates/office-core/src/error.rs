//! Error types for office-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in office-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    /// Worksheet lookup failed
    #[error("Worksheet '{0}' not found.")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Block written to a sheet was empty or ragged
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    /// Colour string or triple could not be parsed
    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    /// Style properties out of range
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// Shape type, placeholder or connector name not in the catalogue
    #[error("{0}")]
    UnknownName(String),
}
