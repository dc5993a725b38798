//! # sheetlink-xlsx
//!
//! XLSX (Office Open XML) package reader and writer for sheetlink.
//!
//! The writer emits one part per modelled object and one `.rels` part per
//! relationship table, copying relationship IDs verbatim. The reader does the
//! reverse and renames numbered parts so that every relationship target again
//! encodes its part's position.

pub mod error;
pub mod reader;
pub mod writer;

mod path;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
