//! Prelude module - common imports for sheetlink users
//!
//! ```rust
//! use sheetlink::prelude::*;
//! ```

pub use crate::{
    // Drawing types
    AnchorCell,
    ChartId,
    ChartPart,
    DrawingId,

    // Error types
    Error,
    RelationshipType,
    RelinkPolicy,
    Result,

    SheetId,
    SheetState,
    Validate,
    ValidationError,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    WorkbookSettings,

    // I/O types
    XlsxReader,
    XlsxWriter,
};
