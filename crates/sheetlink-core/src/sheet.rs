//! Sheet registry entries and the sheet façade

use crate::error::Result;
use crate::relationship::{Relationship, RelationshipHandle, RelationshipTable};
use crate::row::{Row, RowMut};
use crate::schema::{Validate, ValidationError};
use crate::workbook::{DrawingId, SheetId, Workbook};
use crate::worksheet::WorksheetPart;

/// Sheet visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

impl SheetState {
    /// SpreadsheetML attribute value
    pub fn as_str(self) -> &'static str {
        match self {
            SheetState::Visible => "visible",
            SheetState::Hidden => "hidden",
            SheetState::VeryHidden => "veryHidden",
        }
    }

    /// Parse a SpreadsheetML attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visible" => Some(SheetState::Visible),
            "hidden" => Some(SheetState::Hidden),
            "veryHidden" => Some(SheetState::VeryHidden),
            _ => None,
        }
    }
}

/// Sheet registry entry (`<sheet>` in the workbook part)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetEntry {
    name: String,
    sheet_id: u32,
    rel_id: String,
    state: SheetState,
}

impl SheetEntry {
    pub fn new<N: Into<String>, R: Into<String>>(name: N, sheet_id: u32, rel_id: R) -> Self {
        Self {
            name: name.into(),
            sheet_id,
            rel_id: rel_id.into(),
            state: SheetState::Visible,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn sheet_id(&self) -> u32 {
        self.sheet_id
    }

    /// Relationship ID in the workbook part's relationship table
    pub fn rel_id(&self) -> &str {
        &self.rel_id
    }

    pub fn state(&self) -> SheetState {
        self.state
    }

    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }
}

/// Read-only view of one sheet of a workbook
#[derive(Debug, Clone, Copy)]
pub struct Sheet<'a> {
    workbook: &'a Workbook,
    id: SheetId,
}

impl<'a> Sheet<'a> {
    /// Caller has checked that `id` is registered in `workbook`.
    pub(crate) fn new(workbook: &'a Workbook, id: SheetId) -> Self {
        Self { workbook, id }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    /// Registry entry
    pub fn entry(&self) -> &'a SheetEntry {
        &self.workbook.sheets[self.id.index()]
    }

    /// Worksheet part
    pub fn part(&self) -> &'a WorksheetPart {
        &self.workbook.worksheets[self.id.index()]
    }

    /// Relationship table owned by this sheet's worksheet part
    pub fn relationships(&self) -> &'a RelationshipTable {
        &self.workbook.worksheet_rels[self.id.index()]
    }

    /// Display name
    pub fn name(&self) -> &'a str {
        self.entry().name()
    }

    pub fn sheet_id(&self) -> u32 {
        self.entry().sheet_id()
    }

    pub fn state(&self) -> SheetState {
        self.entry().state()
    }

    /// Views of every row, in storage order
    pub fn rows(&self) -> Vec<Row<'a>> {
        self.part().rows()
    }

    /// Get a row by its 1-based number
    pub fn row(&self, number: u32) -> Option<Row<'a>> {
        self.part().row(number)
    }

    pub fn row_count(&self) -> usize {
        self.part().row_count()
    }

    /// Relationship ID of the linked drawing
    pub fn drawing_rel_id(&self) -> Option<&'a str> {
        self.part().drawing().map(|d| d.rel_id())
    }

    /// Resolve the drawing reference back to the linked drawing
    pub fn drawing(&self) -> Option<DrawingId> {
        self.workbook.resolve_sheet_drawing(self.id.index())
    }

    /// Validate the registry entry
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.entry().validate()
    }

    /// Validate the registry entry, reporting errors under `path`
    pub fn validate_with_path(&self, path: &str) -> std::result::Result<(), ValidationError> {
        self.entry().validate_with_path(path)
    }
}

/// Mutable view of one sheet of a workbook
#[derive(Debug)]
pub struct SheetMut<'a> {
    workbook: &'a mut Workbook,
    id: SheetId,
}

impl<'a> SheetMut<'a> {
    /// Caller has checked that `id` is registered in `workbook`.
    pub(crate) fn new(workbook: &'a mut Workbook, id: SheetId) -> Self {
        Self { workbook, id }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    /// Reborrow as a read-only view
    pub fn as_sheet(&self) -> Sheet<'_> {
        Sheet::new(self.workbook, self.id)
    }

    pub fn name(&self) -> &str {
        self.workbook.sheets[self.id.index()].name()
    }

    /// Set the display name. Uniqueness is not checked here.
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.workbook.sheets[self.id.index()].set_name(name);
    }

    pub fn set_state(&mut self, state: SheetState) {
        self.workbook.sheets[self.id.index()].set_state(state);
    }

    /// Append a row numbered `row_count() + 1`
    pub fn add_row(&mut self) -> RowMut<'_> {
        self.workbook.worksheets[self.id.index()].add_row()
    }

    /// Views of every row, in storage order
    pub fn rows(&self) -> Vec<Row<'_>> {
        self.workbook.worksheets[self.id.index()].rows()
    }

    /// Get a mutable row by its 1-based number
    pub fn row_mut(&mut self, number: u32) -> Option<RowMut<'_>> {
        self.workbook.worksheets[self.id.index()].row_mut(number)
    }

    pub fn row_count(&self) -> usize {
        self.workbook.worksheets[self.id.index()].row_count()
    }

    /// Link a drawing to this sheet. See [`Workbook::link_drawing`].
    pub fn set_drawing(&mut self, drawing: DrawingId) -> Result<RelationshipHandle> {
        self.workbook.link_drawing(self.id, drawing)
    }

    /// Unlink the drawing, releasing its relationship entry
    pub fn clear_drawing(&mut self) -> Result<Option<Relationship>> {
        self.workbook.unlink_drawing(self.id)
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.as_sheet().validate()
    }

    pub fn validate_with_path(&self, path: &str) -> std::result::Result<(), ValidationError> {
        self.as_sheet().validate_with_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_state_parse() {
        for state in [SheetState::Visible, SheetState::Hidden, SheetState::VeryHidden] {
            assert_eq!(SheetState::parse(state.as_str()), Some(state));
        }
        assert_eq!(SheetState::parse("shown"), None);
        assert_eq!(SheetState::default(), SheetState::Visible);
    }

    #[test]
    fn test_set_name_accepts_anything() {
        let mut wb = Workbook::new();
        let a = wb.add_sheet_with_name("A").unwrap();
        wb.add_sheet_with_name("B").unwrap();

        let mut sheet = wb.sheet_mut(a).unwrap();
        sheet.set_name("B");
        assert_eq!(sheet.name(), "B");
        sheet.set_name("Q1 <\"&'>");
        assert_eq!(sheet.name(), "Q1 <\"&'>");
    }

    #[test]
    fn test_validate_delegates_to_entry() {
        let mut wb = Workbook::new();
        let id = wb.add_sheet();
        let mut sheet = wb.sheet_mut(id).unwrap();
        assert!(sheet.validate().is_ok());

        sheet.set_name("a/b");
        let err = sheet.validate_with_path("sheets[0]").unwrap_err();
        assert_eq!(err.path, "sheets[0]/name");
    }

    #[test]
    fn test_rows_through_facade() {
        let mut wb = Workbook::new();
        let id = wb.add_sheet();
        {
            let mut sheet = wb.sheet_mut(id).unwrap();
            sheet.add_row();
            sheet.add_row().set_hidden(true);
            sheet.row_mut(1).unwrap().set_height(Some(18.0));
        }
        let sheet = wb.sheet(id).unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.row(1).unwrap().height(), Some(18.0));
        assert!(sheet.row(2).unwrap().is_hidden());
    }
}
