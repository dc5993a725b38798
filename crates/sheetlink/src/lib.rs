//! # sheetlink
//!
//! A Rust library for the part model behind spreadsheet packages.
//!
//! A workbook is a set of parts (the sheet registry, worksheets, drawings and
//! charts) wired together by per-part relationship tables. Sheetlink keeps
//! those tables consistent while you add rows, rename sheets and attach
//! drawings, and reads and writes the result as an XLSX package.
//!
//! ## Features
//!
//! - Monotonic relationship ID minting per part (`rId1`, `rId2`, ...)
//! - Ordered, 1-based row records with height, visibility and outline level
//! - Drawing linking that keeps the relationship target and the worksheet's
//!   drawing reference in step
//! - Schema validation with element paths
//! - XLSX read/write
//!
//! ## Example
//!
//! ```rust
//! use sheetlink::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.add_sheet();
//! let drawing = workbook.add_drawing();
//! workbook
//!     .drawing_mut(drawing)
//!     .unwrap()
//!     .add_chart(ChartPart::new().with_title("Sales"), AnchorCell::new(0, 0), AnchorCell::new(6, 12));
//!
//! let mut view = workbook.sheet_mut(sheet).unwrap();
//! view.set_name("Sales");
//! view.add_row().set_height(Some(18.0));
//! view.set_drawing(drawing).unwrap();
//!
//! assert_eq!(workbook.sheet(sheet).unwrap().drawing_rel_id(), Some("rId1"));
//!
//! // Save to file
//! // workbook.save("sales.xlsx").unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use sheetlink_core::{
    AnchorCell,
    ChartAnchor,
    // Handles
    ChartId,
    ChartPart,
    // Relationship types
    DocumentType,
    // Drawing types
    Drawing,
    DrawingId,
    DrawingMut,
    DrawingPart,
    DrawingRef,
    // Error types
    Error,
    Relationship,
    RelationshipHandle,
    RelationshipTable,
    RelationshipType,
    RelinkPolicy,
    Result,
    // Row types
    Row,
    RowMut,
    RowRecord,
    // Sheet types
    Sheet,
    SheetEntry,
    SheetId,
    SheetMut,
    SheetState,
    // Validation
    Validate,
    ValidationError,
    // Main types
    Workbook,
    WorkbookSettings,
    WorksheetPart,

    // Constants
    MAX_ROWS,
    MAX_ROW_HEIGHT,
    MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use sheetlink_xlsx::{XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook to a file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        match lowercase_extension(path).as_deref() {
            Some("xlsx") | Some("xlsm") => XlsxReader::read_file(path).map_err(into_core_error),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match lowercase_extension(path).as_deref() {
            Some("xlsx") => XlsxWriter::write_file(self, path).map_err(into_core_error),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Keep model errors as they are; everything else becomes `Error::Other`
fn into_core_error(err: XlsxError) -> Error {
    match err {
        XlsxError::Core(err) => err,
        other => Error::other(other.to_string()),
    }
}
