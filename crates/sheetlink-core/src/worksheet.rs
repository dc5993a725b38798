//! Worksheet part - the mutable body of one sheet

use crate::row::{Row, RowMut, RowRecord};

/// Reference from a worksheet to its drawing, by relationship ID
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawingRef {
    rel_id: String,
}

impl DrawingRef {
    pub fn new<S: Into<String>>(rel_id: S) -> Self {
        Self {
            rel_id: rel_id.into(),
        }
    }

    /// Relationship ID in the owning worksheet's relationship table
    pub fn rel_id(&self) -> &str {
        &self.rel_id
    }
}

/// Worksheet part: rows plus an optional drawing reference
///
/// Rows are numbered densely from 1 in creation order. Appending is the only
/// way to add a row.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorksheetPart {
    rows: Vec<RowRecord>,
    drawing: Option<DrawingRef>,
}

impl WorksheetPart {
    /// Create an empty worksheet part
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row numbered `row_count() + 1`
    pub fn add_row(&mut self) -> RowMut<'_> {
        let number = self.rows.len() as u32 + 1;
        self.rows.push(RowRecord::new(number));
        let index = self.rows.len() - 1;
        RowMut::new(&mut self.rows[index])
    }

    /// Views of every stored row, in storage order
    pub fn rows(&self) -> Vec<Row<'_>> {
        self.rows.iter().map(Row::new).collect()
    }

    /// Get a row by its 1-based number
    pub fn row(&self, number: u32) -> Option<Row<'_>> {
        let index = (number as usize).checked_sub(1)?;
        self.rows.get(index).map(Row::new)
    }

    /// Get a mutable row by its 1-based number
    pub fn row_mut(&mut self, number: u32) -> Option<RowMut<'_>> {
        let index = (number as usize).checked_sub(1)?;
        self.rows.get_mut(index).map(RowMut::new)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Raw row records
    pub fn row_records(&self) -> &[RowRecord] {
        &self.rows
    }

    /// The drawing reference, if any
    pub fn drawing(&self) -> Option<&DrawingRef> {
        self.drawing.as_ref()
    }

    /// Replace the drawing reference, returning the previous one
    pub fn replace_drawing(&mut self, drawing: Option<DrawingRef>) -> Option<DrawingRef> {
        std::mem::replace(&mut self.drawing, drawing)
    }
}
