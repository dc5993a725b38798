//! # sheetlink-core
//!
//! In-memory part model for the sheetlink spreadsheet library.
//!
//! The [`Workbook`] owns every package part: the sheet registry, worksheet
//! parts with their rows, drawing and chart parts, and one
//! [`RelationshipTable`] per part that points at other parts. Sheets,
//! drawings and charts are addressed by stable handles ([`SheetId`],
//! [`DrawingId`], [`ChartId`]); [`Sheet`] and [`Drawing`] are short-lived
//! views resolved through those handles.
//!
//! ## Example
//!
//! ```rust
//! use sheetlink_core::Workbook;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.add_sheet_with_name("Report").unwrap();
//! let drawing = workbook.add_drawing();
//!
//! let mut view = workbook.sheet_mut(sheet).unwrap();
//! view.add_row();
//! view.add_row().set_hidden(true);
//! let rel = view.set_drawing(drawing).unwrap();
//!
//! assert_eq!(rel.id(), "rId1");
//! assert_eq!(workbook.sheet(sheet).unwrap().drawing(), Some(drawing));
//! assert!(workbook.validate().is_ok());
//! ```

pub mod drawing;
pub mod error;
pub mod relationship;
pub mod row;
pub mod schema;
pub mod sheet;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use drawing::{AnchorCell, ChartAnchor, ChartPart, Drawing, DrawingMut, DrawingPart};
pub use error::{Error, Result};
pub use relationship::{
    DocumentType, Relationship, RelationshipHandle, RelationshipTable, RelationshipType,
};
pub use row::{Row, RowMut, RowRecord};
pub use schema::{Validate, ValidationError};
pub use sheet::{Sheet, SheetEntry, SheetMut, SheetState};
pub use workbook::{ChartId, DrawingId, RelinkPolicy, SheetId, Workbook, WorkbookSettings};
pub use worksheet::{DrawingRef, WorksheetPart};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum row height in points
pub const MAX_ROW_HEIGHT: f64 = 409.0;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
