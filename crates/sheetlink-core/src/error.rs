//! Error types for sheetlink-core

use thiserror::Error;

use crate::schema::ValidationError;
use crate::workbook::{ChartId, DrawingId, SheetId};

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetlink-core
#[derive(Debug, Error)]
pub enum Error {
    /// Sheet handle is not registered in this workbook
    #[error("Worksheet {0:?} is not registered in the workbook")]
    SheetNotFound(SheetId),

    /// Drawing handle is not registered in this workbook
    #[error("Drawing {0:?} is not registered in the workbook")]
    DrawingNotFound(DrawingId),

    /// Chart handle is not registered in this workbook
    #[error("Chart {0:?} is not registered in the workbook")]
    ChartNotFound(ChartId),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Row outline level outside 0..=7
    #[error("Outline level {0} out of range (max: 7)")]
    InvalidOutlineLevel(u8),

    /// Relationship ID already present in the table
    #[error("Relationship ID already exists: {0}")]
    DuplicateRelationshipId(String),

    /// Schema or link validation failure
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
