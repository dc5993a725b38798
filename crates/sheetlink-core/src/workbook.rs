//! Workbook type - the root owner of every part

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::drawing::{ChartPart, Drawing, DrawingMut, DrawingPart};
use crate::error::{Error, Result};
use crate::relationship::{
    DocumentType, Relationship, RelationshipHandle, RelationshipTable, RelationshipType,
};
use crate::schema::{check_sheet_name, Validate, ValidationError};
use crate::sheet::{Sheet, SheetEntry, SheetMut};
use crate::worksheet::{DrawingRef, WorksheetPart};

/// Handle to a sheet registered in a [`Workbook`]
///
/// Handles remember the workbook that minted them and are rejected by any
/// other workbook. Clones and deserialized copies share the identity of
/// their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetId {
    workbook: u64,
    index: usize,
}

impl SheetId {
    /// 0-based position in the workbook's sheet sequence
    pub fn index(self) -> usize {
        self.index
    }
}

/// Handle to a drawing registered in a [`Workbook`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawingId {
    workbook: u64,
    index: usize,
}

impl DrawingId {
    /// 0-based position in the workbook's drawing sequence
    pub fn index(self) -> usize {
        self.index
    }
}

/// Handle to a chart registered in a [`Workbook`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartId {
    workbook: u64,
    index: usize,
}

impl ChartId {
    /// 0-based position in the workbook's chart sequence
    pub fn index(self) -> usize {
        self.index
    }
}

/// Source of workbook identities
static NEXT_WORKBOOK: AtomicU64 = AtomicU64::new(1);

/// What happens to the old drawing relationship when a sheet is re-linked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelinkPolicy {
    /// Leave the old entry in the table, unreferenced
    #[default]
    KeepOrphan,
    /// Remove the old entry from the table
    ReleasePrevious,
}

/// Workbook-level settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkbookSettings {
    /// Handling of the previous drawing relationship on re-link
    pub relink_policy: RelinkPolicy,
    /// Run [`Workbook::validate`] before writing a package
    pub verify_on_save: bool,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            relink_policy: RelinkPolicy::KeepOrphan,
            verify_on_save: true,
        }
    }
}

/// A workbook (spreadsheet package model)
///
/// The workbook owns every part. `sheets`, `worksheets` and `worksheet_rels`
/// are index-aligned: entry `i` of each belongs to the same sheet, and they
/// only ever grow together. The same holds for `drawings` and
/// `drawing_rels`. Parts are never removed, so handles stay valid for the
/// lifetime of the workbook.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Workbook {
    /// Identity stamped into every handle this workbook mints
    id: u64,
    pub(crate) sheets: Vec<SheetEntry>,
    pub(crate) worksheets: Vec<WorksheetPart>,
    pub(crate) worksheet_rels: Vec<RelationshipTable>,
    pub(crate) drawings: Vec<DrawingPart>,
    pub(crate) drawing_rels: Vec<RelationshipTable>,
    pub(crate) charts: Vec<ChartPart>,
    /// Relationships owned by the workbook part itself
    workbook_rels: RelationshipTable,
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create an empty workbook with no sheets
    pub fn new() -> Self {
        Self::with_settings(WorkbookSettings::default())
    }

    /// Create an empty workbook with the given settings
    pub fn with_settings(settings: WorkbookSettings) -> Self {
        Self {
            id: NEXT_WORKBOOK.fetch_add(1, Ordering::Relaxed),
            sheets: Vec::new(),
            worksheets: Vec::new(),
            worksheet_rels: Vec::new(),
            drawings: Vec::new(),
            drawing_rels: Vec::new(),
            charts: Vec::new(),
            workbook_rels: RelationshipTable::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    /// Relationships owned by the workbook part
    pub fn workbook_relationships(&self) -> &RelationshipTable {
        &self.workbook_rels
    }

    /// Mutable workbook relationships, for package readers
    pub fn workbook_relationships_mut(&mut self) -> &mut RelationshipTable {
        &mut self.workbook_rels
    }

    // ==================== Sheets ====================

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Add a new sheet with a generated name
    pub fn add_sheet(&mut self) -> SheetId {
        let name = self.generate_sheet_name();
        self.register_sheet(&name)
    }

    /// Add a new sheet with the given name
    pub fn add_sheet_with_name(&mut self, name: &str) -> Result<SheetId> {
        self.validate_sheet_name(name)?;
        Ok(self.register_sheet(name))
    }

    fn register_sheet(&mut self, name: &str) -> SheetId {
        let position = self.sheets.len() + 1;
        let handle = self.workbook_rels.add_auto_relationship(
            DocumentType::Spreadsheet,
            position,
            RelationshipType::Worksheet,
        );
        let entry = SheetEntry::new(name, self.next_sheet_id(), handle.id());
        self.insert_sheet_part(entry, WorksheetPart::new(), RelationshipTable::new())
    }

    /// Register a sheet from its three parts at once.
    ///
    /// Used by package readers; the entry's relationship ID must already be
    /// present in [`Workbook::workbook_relationships`].
    pub fn insert_sheet_part(
        &mut self,
        entry: SheetEntry,
        part: WorksheetPart,
        rels: RelationshipTable,
    ) -> SheetId {
        let id = self.sheet_handle(self.sheets.len());
        self.sheets.push(entry);
        self.worksheets.push(part);
        self.worksheet_rels.push(rels);
        debug_assert_eq!(self.sheets.len(), self.worksheets.len());
        debug_assert_eq!(self.worksheets.len(), self.worksheet_rels.len());
        id
    }

    /// Get a sheet view
    pub fn sheet(&self, id: SheetId) -> Result<Sheet<'_>> {
        let index = self.sheet_index(id)?;
        Ok(Sheet::new(self, self.sheet_handle(index)))
    }

    /// Get a mutable sheet view
    pub fn sheet_mut(&mut self, id: SheetId) -> Result<SheetMut<'_>> {
        let index = self.sheet_index(id)?;
        let id = self.sheet_handle(index);
        Ok(SheetMut::new(self, id))
    }

    /// Find a sheet by name
    pub fn sheet_by_name(&self, name: &str) -> Option<Sheet<'_>> {
        self.sheets
            .iter()
            .position(|s| s.name() == name)
            .map(|i| Sheet::new(self, self.sheet_handle(i)))
    }

    /// Handles of every sheet, in order
    pub fn sheet_ids(&self) -> impl Iterator<Item = SheetId> {
        let workbook = self.id;
        (0..self.sheets.len()).map(move |index| SheetId { workbook, index })
    }

    /// Iterate over all sheets
    pub fn sheets(&self) -> impl Iterator<Item = Sheet<'_>> {
        self.sheet_ids().map(move |id| Sheet::new(self, id))
    }

    fn sheet_index(&self, id: SheetId) -> Result<usize> {
        let registered = id.workbook == self.id
            && id.index < self.sheets.len()
            && id.index < self.worksheets.len()
            && id.index < self.worksheet_rels.len();
        if registered {
            Ok(id.index)
        } else {
            Err(Error::SheetNotFound(id))
        }
    }

    // ==================== Drawings and charts ====================

    pub fn drawing_count(&self) -> usize {
        self.drawings.len()
    }

    /// Add an empty drawing part
    pub fn add_drawing(&mut self) -> DrawingId {
        self.insert_drawing_part(DrawingPart::new(), RelationshipTable::new())
    }

    /// Register a drawing part with its relationship table
    pub fn insert_drawing_part(&mut self, part: DrawingPart, rels: RelationshipTable) -> DrawingId {
        let id = self.drawing_handle(self.drawings.len());
        self.drawings.push(part);
        self.drawing_rels.push(rels);
        id
    }

    pub fn drawing(&self, id: DrawingId) -> Result<Drawing<'_>> {
        let index = self.drawing_index(id)?;
        Ok(Drawing::new(self, self.drawing_handle(index)))
    }

    pub fn drawing_mut(&mut self, id: DrawingId) -> Result<DrawingMut<'_>> {
        let index = self.drawing_index(id)?;
        let id = self.drawing_handle(index);
        Ok(DrawingMut::new(self, id))
    }

    /// Handle of the drawing at a 1-based position
    pub fn drawing_id_at(&self, position: usize) -> Option<DrawingId> {
        let index = position.checked_sub(1)?;
        (index < self.drawings.len()).then(|| self.drawing_handle(index))
    }

    pub fn drawing_ids(&self) -> impl Iterator<Item = DrawingId> {
        let workbook = self.id;
        (0..self.drawings.len()).map(move |index| DrawingId { workbook, index })
    }

    fn drawing_index(&self, id: DrawingId) -> Result<usize> {
        let registered = id.workbook == self.id
            && id.index < self.drawings.len()
            && id.index < self.drawing_rels.len();
        if registered {
            Ok(id.index)
        } else {
            Err(Error::DrawingNotFound(id))
        }
    }

    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    /// Register a chart part
    pub fn insert_chart_part(&mut self, chart: ChartPart) -> ChartId {
        let id = self.chart_handle(self.charts.len());
        self.charts.push(chart);
        id
    }

    pub fn chart(&self, id: ChartId) -> Result<&ChartPart> {
        let index = self.chart_index(id)?;
        Ok(&self.charts[index])
    }

    pub fn chart_mut(&mut self, id: ChartId) -> Result<&mut ChartPart> {
        let index = self.chart_index(id)?;
        Ok(&mut self.charts[index])
    }

    /// Handle of the chart at a 1-based position
    pub fn chart_id_at(&self, position: usize) -> Option<ChartId> {
        let index = position.checked_sub(1)?;
        (index < self.charts.len()).then(|| self.chart_handle(index))
    }

    fn chart_index(&self, id: ChartId) -> Result<usize> {
        if id.workbook == self.id && id.index < self.charts.len() {
            Ok(id.index)
        } else {
            Err(Error::ChartNotFound(id))
        }
    }

    fn sheet_handle(&self, index: usize) -> SheetId {
        SheetId {
            workbook: self.id,
            index,
        }
    }

    fn drawing_handle(&self, index: usize) -> DrawingId {
        DrawingId {
            workbook: self.id,
            index,
        }
    }

    fn chart_handle(&self, index: usize) -> ChartId {
        ChartId {
            workbook: self.id,
            index,
        }
    }

    // ==================== Linking ====================

    /// Attach a drawing to a sheet.
    ///
    /// Registers a drawing relationship in the sheet's relationship table,
    /// targeting the drawing's 1-based position, and points the worksheet's
    /// single drawing reference at it. A previous reference is replaced; what
    /// happens to its relationship entry depends on
    /// [`WorkbookSettings::relink_policy`].
    ///
    /// Fails without touching the worksheet if either handle is unknown.
    pub fn link_drawing(&mut self, sheet: SheetId, drawing: DrawingId) -> Result<RelationshipHandle> {
        let index = self.sheet_index(sheet)?;
        let position = self.drawing_index(drawing)? + 1;

        let rels = &mut self.worksheet_rels[index];
        let handle =
            rels.add_auto_relationship(DocumentType::Spreadsheet, position, RelationshipType::Drawing);
        let previous = self.worksheets[index].replace_drawing(Some(DrawingRef::new(handle.id())));

        if let Some(previous) = previous {
            match self.settings.relink_policy {
                RelinkPolicy::KeepOrphan => warn!(
                    "sheet '{}' re-linked to drawing {}; relationship {} left unreferenced",
                    self.sheets[index].name(),
                    position,
                    previous.rel_id()
                ),
                RelinkPolicy::ReleasePrevious => {
                    rels.remove(previous.rel_id());
                    debug!(
                        "released relationship {} of sheet '{}'",
                        previous.rel_id(),
                        self.sheets[index].name()
                    );
                }
            }
        }

        debug!(
            "linked sheet '{}' to drawing {} as {}",
            self.sheets[index].name(),
            position,
            handle.id()
        );
        Ok(handle)
    }

    /// Detach the drawing from a sheet, removing its relationship entry.
    ///
    /// Returns the removed entry, or `None` if no drawing was linked.
    pub fn unlink_drawing(&mut self, sheet: SheetId) -> Result<Option<Relationship>> {
        let index = self.sheet_index(sheet)?;
        let removed = self.worksheets[index]
            .replace_drawing(None)
            .and_then(|previous| self.worksheet_rels[index].remove(previous.rel_id()));
        Ok(removed)
    }

    /// Drawing relationships of a sheet that its drawing reference does not
    /// point at
    pub fn orphaned_relationships(&self, sheet: SheetId) -> Result<Vec<&Relationship>> {
        let index = self.sheet_index(sheet)?;
        let current = self.worksheets[index].drawing().map(|d| d.rel_id());
        Ok(self.worksheet_rels[index]
            .iter()
            .filter(|rel| rel.is(RelationshipType::Drawing))
            .filter(|rel| Some(rel.id.as_str()) != current)
            .collect())
    }

    pub(crate) fn resolve_sheet_drawing(&self, index: usize) -> Option<DrawingId> {
        let drawing = self.worksheets.get(index)?.drawing()?;
        let rel = self.worksheet_rels.get(index)?.get(drawing.rel_id())?;
        if !rel.is(RelationshipType::Drawing) {
            return None;
        }
        self.drawing_id_at(rel.target_position()?)
    }

    // ==================== Validation ====================

    /// Validate every sheet and verify that every relationship reference
    /// resolves to the part it names.
    ///
    /// A workbook needs at least one sheet, and sheet names must be unique
    /// ignoring case.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.sheets.is_empty() {
            return Err(ValidationError::new(
                "workbook/sheets",
                "a workbook must contain at least one sheet",
            ));
        }
        for (i, (entry, part)) in self.sheets.iter().zip(&self.worksheets).enumerate() {
            let path = format!("workbook/sheets/sheet[{}]", i + 1);
            entry.validate_with_path(&path)?;
            if self.name_taken(entry.name(), i) {
                return Err(ValidationError::new(
                    format!("{path}/name"),
                    format!("duplicate sheet name '{}'", entry.name()),
                ));
            }
            part.validate_with_path(&format!("xl/worksheets/sheet{}.xml", i + 1))?;
        }
        self.verify_links()
    }

    fn verify_links(&self) -> std::result::Result<(), ValidationError> {
        for (i, entry) in self.sheets.iter().enumerate() {
            let path = format!("workbook/sheets/sheet[{}]", i + 1);
            let rel = self.workbook_rels.get(entry.rel_id()).ok_or_else(|| {
                ValidationError::new(
                    format!("{path}/r:id"),
                    format!("relationship {} not found in workbook part", entry.rel_id()),
                )
            })?;
            rel.validate_with_path(&format!("xl/_rels/workbook.xml.rels/{}", rel.id))?;
            if !rel.is(RelationshipType::Worksheet) || rel.target_position() != Some(i + 1) {
                return Err(ValidationError::new(
                    format!("{path}/r:id"),
                    format!("relationship {} does not target worksheet {}", rel.id, i + 1),
                ));
            }
        }

        for (i, (part, rels)) in self.worksheets.iter().zip(&self.worksheet_rels).enumerate() {
            let rels_path = format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1);
            for rel in rels.iter() {
                rel.validate_with_path(&format!("{rels_path}/{}", rel.id))?;
            }
            let Some(drawing) = part.drawing() else {
                continue;
            };
            let path = format!("xl/worksheets/sheet{}.xml/drawing/r:id", i + 1);
            let rel = rels.get(drawing.rel_id()).ok_or_else(|| {
                ValidationError::new(
                    path.clone(),
                    format!("relationship {} not found", drawing.rel_id()),
                )
            })?;
            self.check_target(rel, RelationshipType::Drawing, self.drawings.len(), &path)?;
        }

        for (i, (part, rels)) in self.drawings.iter().zip(&self.drawing_rels).enumerate() {
            for (j, anchor) in part.anchors().iter().enumerate() {
                let path = format!(
                    "xl/drawings/drawing{}.xml/twoCellAnchor[{}]/chart/r:id",
                    i + 1,
                    j + 1
                );
                let rel = rels.get(&anchor.rel_id).ok_or_else(|| {
                    ValidationError::new(
                        path.clone(),
                        format!("relationship {} not found", anchor.rel_id),
                    )
                })?;
                self.check_target(rel, RelationshipType::Chart, self.charts.len(), &path)?;
                let chart = self.chart_index(anchor.chart).map_err(|_| {
                    ValidationError::new(path.clone(), "anchored chart is not part of this workbook")
                })?;
                if rel.target_position() != Some(chart + 1) {
                    return Err(ValidationError::new(
                        path,
                        format!("relationship {} does not target chart {}", rel.id, chart + 1),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_target(
        &self,
        rel: &Relationship,
        expected: RelationshipType,
        count: usize,
        path: &str,
    ) -> std::result::Result<(), ValidationError> {
        if !rel.is(expected) {
            return Err(ValidationError::new(
                path,
                format!("relationship {} has type {}", rel.id, rel.type_uri),
            ));
        }
        match rel.target_position() {
            Some(position) if position <= count => Ok(()),
            _ => Err(ValidationError::new(
                path,
                format!("relationship {} targets missing part {}", rel.id, rel.target),
            )),
        }
    }

    // ==================== Naming ====================

    /// Validate a new sheet name, including case-insensitive uniqueness
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        check_sheet_name(name).map_err(Error::InvalidSheetName)?;

        if self.name_taken(name, self.sheets.len()) {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }

    /// Whether one of the first `before` sheets already uses `name`, ignoring case
    fn name_taken(&self, name: &str, before: usize) -> bool {
        let name_lower = name.to_lowercase();
        self.sheets[..before]
            .iter()
            .any(|s| s.name().to_lowercase() == name_lower)
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.sheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }

    fn next_sheet_id(&self) -> u32 {
        self.sheets.iter().map(|s| s.sheet_id()).max().unwrap_or(0) + 1
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drawing_rels(wb: &Workbook, sheet: SheetId) -> Vec<(String, String)> {
        wb.sheet(sheet)
            .unwrap()
            .relationships()
            .iter()
            .map(|r| (r.id.clone(), r.target.clone()))
            .collect()
    }

    #[test]
    fn test_new_workbook_is_empty() {
        let wb = Workbook::new();
        assert!(wb.is_empty());
        assert_eq!(wb.sheet_count(), 0);
    }

    #[test]
    fn test_validate_requires_a_sheet() {
        let mut wb = Workbook::new();
        assert_eq!(wb.validate().unwrap_err().path, "workbook/sheets");

        wb.add_sheet();
        assert!(wb.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_duplicate_names() {
        let mut wb = Workbook::new();
        let first = wb.add_sheet();
        wb.add_sheet();
        wb.sheet_mut(first).unwrap().set_name("sheet2");

        let err = wb.validate().unwrap_err();
        assert_eq!(err.path, "workbook/sheets/sheet[2]/name");
        assert!(err.message.contains("duplicate"));
    }

    #[test]
    fn test_add_sheets() {
        let mut wb = Workbook::new();
        let a = wb.add_sheet();
        let b = wb.add_sheet_with_name("Data").unwrap();

        assert_eq!(wb.sheet(a).unwrap().name(), "Sheet1");
        assert_eq!(wb.sheet(b).unwrap().name(), "Data");
        assert_eq!(wb.sheet(b).unwrap().sheet_id(), 2);

        let rel = wb
            .workbook_relationships()
            .get(wb.sheet(b).unwrap().entry().rel_id())
            .unwrap();
        assert_eq!(rel.target, "worksheets/sheet2.xml");
        assert!(wb.validate().is_ok());
    }

    #[test]
    fn test_duplicate_name() {
        let mut wb = Workbook::new();
        wb.add_sheet();

        // Case-insensitive duplicate check
        assert!(matches!(
            wb.add_sheet_with_name("SHEET1"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert!(wb.add_sheet_with_name("sheet1").is_err());
        assert!(matches!(
            wb.add_sheet_with_name("a*b"),
            Err(Error::InvalidSheetName(_))
        ));
    }

    #[test]
    fn test_generated_name_skips_taken() {
        let mut wb = Workbook::new();
        wb.add_sheet_with_name("Sheet2").unwrap();
        let id = wb.add_sheet();
        assert_eq!(wb.sheet(id).unwrap().name(), "Sheet3");
    }

    #[test]
    fn test_link_drawing() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        wb.add_drawing();
        let second = wb.add_drawing();

        let handle = wb.link_drawing(sheet, second).unwrap();
        assert_eq!(handle.id(), "rId1");

        let view = wb.sheet(sheet).unwrap();
        assert_eq!(view.drawing_rel_id(), Some("rId1"));
        assert_eq!(view.drawing(), Some(second));
        assert_eq!(
            drawing_rels(&wb, sheet),
            vec![("rId1".to_string(), "../drawings/drawing2.xml".to_string())]
        );
        assert!(wb.validate().is_ok());
    }

    #[test]
    fn test_relink_keeps_orphan() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        let d1 = wb.add_drawing();
        let d2 = wb.add_drawing();

        wb.link_drawing(sheet, d1).unwrap();
        let second = wb.link_drawing(sheet, d2).unwrap();

        assert_eq!(wb.sheet(sheet).unwrap().drawing_rel_id(), Some(second.id()));
        assert_eq!(wb.sheet(sheet).unwrap().relationships().len(), 2);
        let orphans = wb.orphaned_relationships(sheet).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, "rId1");
        assert!(wb.validate().is_ok());
    }

    #[test]
    fn test_relink_release_previous() {
        let mut wb = Workbook::with_settings(WorkbookSettings {
            relink_policy: RelinkPolicy::ReleasePrevious,
            ..WorkbookSettings::default()
        });
        let sheet = wb.add_sheet();
        let d1 = wb.add_drawing();
        let d2 = wb.add_drawing();

        wb.link_drawing(sheet, d1).unwrap();
        let second = wb.link_drawing(sheet, d2).unwrap();

        assert_eq!(second.id(), "rId2");
        assert_eq!(
            drawing_rels(&wb, sheet),
            vec![("rId2".to_string(), "../drawings/drawing2.xml".to_string())]
        );
        assert!(wb.orphaned_relationships(sheet).unwrap().is_empty());
    }

    #[test]
    fn test_link_unknown_drawing_fails_without_mutation() {
        let mut other = Workbook::new();
        other.add_drawing();
        let foreign = other.add_drawing();

        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        let d = wb.add_drawing();
        wb.link_drawing(sheet, d).unwrap();

        let err = wb.link_drawing(sheet, foreign).unwrap_err();
        assert!(matches!(err, Error::DrawingNotFound(id) if id == foreign));
        assert_eq!(wb.sheet(sheet).unwrap().drawing_rel_id(), Some("rId1"));
        assert_eq!(wb.sheet(sheet).unwrap().relationships().len(), 1);
    }

    #[test]
    fn test_link_unknown_sheet_fails() {
        let mut other = Workbook::new();
        other.add_sheet();
        let foreign = other.add_sheet();

        let mut wb = Workbook::new();
        wb.add_sheet();
        let d = wb.add_drawing();
        assert!(matches!(
            wb.link_drawing(foreign, d),
            Err(Error::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_foreign_handles_at_same_index_are_rejected() {
        let mut other = Workbook::new();
        let other_sheet = other.add_sheet();
        let other_drawing = other.add_drawing();
        let other_chart = other
            .drawing_mut(other_drawing)
            .unwrap()
            .add_chart(ChartPart::new(), Default::default(), Default::default());

        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        let drawing = wb.add_drawing();
        wb.drawing_mut(drawing)
            .unwrap()
            .add_chart(ChartPart::new(), Default::default(), Default::default());
        assert_eq!(other_drawing.index(), drawing.index());

        assert!(matches!(
            wb.link_drawing(sheet, other_drawing),
            Err(Error::DrawingNotFound(id)) if id == other_drawing
        ));
        assert!(matches!(
            wb.link_drawing(other_sheet, drawing),
            Err(Error::SheetNotFound(id)) if id == other_sheet
        ));
        assert!(wb.sheet(other_sheet).is_err());
        assert!(wb.drawing(other_drawing).is_err());
        assert!(matches!(
            wb.chart(other_chart),
            Err(Error::ChartNotFound(_))
        ));
        assert!(wb
            .drawing_mut(drawing)
            .unwrap()
            .anchor_chart(other_chart, Default::default(), Default::default())
            .is_err());

        let view = wb.sheet(sheet).unwrap();
        assert_eq!(view.drawing_rel_id(), None);
        assert!(view.relationships().is_empty());
    }

    #[test]
    fn test_clone_shares_handles() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        let copy = wb.clone();
        assert_eq!(copy.sheet(sheet).unwrap().name(), "Sheet1");
        assert_eq!(copy, wb);
    }

    #[test]
    fn test_unlink_drawing() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        let d = wb.add_drawing();
        wb.link_drawing(sheet, d).unwrap();

        let removed = wb.unlink_drawing(sheet).unwrap().unwrap();
        assert_eq!(removed.id, "rId1");
        assert!(wb.sheet(sheet).unwrap().drawing_rel_id().is_none());
        assert!(wb.unlink_drawing(sheet).unwrap().is_none());

        // IDs are not reused after removal
        let handle = wb.link_drawing(sheet, d).unwrap();
        assert_eq!(handle.id(), "rId2");
    }

    #[test]
    fn test_validate_reports_dangling_drawing_reference() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        wb.worksheets[sheet.index()].replace_drawing(Some(DrawingRef::new("rId9")));

        let err = wb.validate().unwrap_err();
        assert_eq!(err.path, "xl/worksheets/sheet1.xml/drawing/r:id");
    }

    #[test]
    fn test_validate_reports_missing_drawing_part() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        let handle = wb.worksheet_rels[sheet.index()].add_auto_relationship(
            DocumentType::Spreadsheet,
            4,
            RelationshipType::Drawing,
        );
        wb.worksheets[sheet.index()].replace_drawing(Some(DrawingRef::new(handle.id())));

        let err = wb.validate().unwrap_err();
        assert!(err.message.contains("missing part"));
    }

    #[test]
    fn test_validate_reports_bad_sheet_name() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet();
        wb.sheet_mut(sheet).unwrap().set_name("");
        assert_eq!(wb.validate().unwrap_err().path, "workbook/sheets/sheet[1]/name");
    }

    #[test]
    fn test_drawing_id_at() {
        let mut wb = Workbook::new();
        let d = wb.add_drawing();
        assert_eq!(wb.drawing_id_at(1), Some(d));
        assert_eq!(wb.drawing_id_at(0), None);
        assert_eq!(wb.drawing_id_at(2), None);
    }
}
