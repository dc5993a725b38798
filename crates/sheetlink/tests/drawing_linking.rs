//! End-to-end tests for sheets, rows and drawing links through the public API

use pretty_assertions::assert_eq;
use sheetlink::prelude::*;

/// Rows are numbered 1..N in creation order
#[test]
fn test_rows_in_creation_order() {
    let mut wb = Workbook::new();
    let id = wb.add_sheet();
    let mut sheet = wb.sheet_mut(id).unwrap();

    for expected in 1..=5u32 {
        assert_eq!(sheet.add_row().number(), expected);
    }

    let numbers: Vec<u32> = sheet.rows().iter().map(|r| r.number()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(sheet.row_count(), 5);
}

/// Names are stored verbatim, special characters included
#[test]
fn test_set_name_verbatim() {
    let mut wb = Workbook::new();
    let id = wb.add_sheet();

    for name in ["X", "Q1 & Q2 <draft>", "Ünïcødé \u{1F600}", "a\"b'c"] {
        wb.sheet_mut(id).unwrap().set_name(name);
        assert_eq!(wb.sheet(id).unwrap().name(), name);
    }
}

/// Linking drawing k appends one relationship whose target encodes k
#[test]
fn test_link_drawing_at_position() {
    let mut wb = Workbook::new();
    let sheet = wb.add_sheet();
    let first = wb.add_drawing();
    let second = wb.add_drawing();
    let third = wb.add_drawing();
    assert_ne!(first, second);

    let handle = wb.sheet_mut(sheet).unwrap().set_drawing(third).unwrap();

    let view = wb.sheet(sheet).unwrap();
    assert_eq!(view.relationships().len(), 1);
    assert_eq!(view.drawing_rel_id(), Some(handle.id()));

    let rel = view.relationships().get(handle.id()).unwrap();
    assert_eq!(rel.type_uri, RelationshipType::Drawing.uri());
    assert_eq!(rel.target, "../drawings/drawing3.xml");
    assert_eq!(view.drawing(), Some(third));
}

/// Relinking overwrites the reference and keeps the first entry as an orphan
#[test]
fn test_relink_keeps_orphan() {
    let mut wb = Workbook::new();
    let sheet = wb.add_sheet();
    let a = wb.add_drawing();
    let b = wb.add_drawing();

    let first = wb.sheet_mut(sheet).unwrap().set_drawing(a).unwrap();
    let second = wb.sheet_mut(sheet).unwrap().set_drawing(b).unwrap();

    let view = wb.sheet(sheet).unwrap();
    assert_eq!(first.id(), "rId1");
    assert_eq!(second.id(), "rId2");
    assert_eq!(view.drawing_rel_id(), Some("rId2"));
    assert!(view.relationships().contains("rId1"));
    assert_eq!(view.relationships().len(), 2);

    let orphans: Vec<&str> = wb
        .orphaned_relationships(sheet)
        .unwrap()
        .into_iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(orphans, vec!["rId1"]);
    assert!(wb.validate().is_ok());
}

/// The release policy removes the previous entry instead
#[test]
fn test_relink_with_release_policy() {
    let mut wb = Workbook::with_settings(WorkbookSettings {
        relink_policy: RelinkPolicy::ReleasePrevious,
        ..Default::default()
    });
    let sheet = wb.add_sheet();
    let a = wb.add_drawing();
    let b = wb.add_drawing();

    wb.sheet_mut(sheet).unwrap().set_drawing(a).unwrap();
    wb.sheet_mut(sheet).unwrap().set_drawing(b).unwrap();

    let view = wb.sheet(sheet).unwrap();
    assert_eq!(view.relationships().len(), 1);
    assert!(!view.relationships().contains("rId1"));
    assert_eq!(view.drawing_rel_id(), Some("rId2"));
    assert!(wb.orphaned_relationships(sheet).unwrap().is_empty());
}

/// A drawing from another workbook is rejected without touching the sheet
#[test]
fn test_unregistered_drawing_is_rejected() {
    let mut other = Workbook::new();
    other.add_drawing();
    let foreign = other.add_drawing();

    let mut wb = Workbook::new();
    let sheet = wb.add_sheet();

    let err = wb.sheet_mut(sheet).unwrap().set_drawing(foreign).unwrap_err();
    assert!(matches!(err, Error::DrawingNotFound(id) if id == foreign));

    let view = wb.sheet(sheet).unwrap();
    assert_eq!(view.drawing_rel_id(), None);
    assert!(view.relationships().is_empty());
}

/// A drawing from another workbook is rejected even when its position exists here
#[test]
fn test_foreign_drawing_at_existing_position_is_rejected() {
    let mut other = Workbook::new();
    let foreign = other.add_drawing();
    let foreign_sheet = other.add_sheet();

    let mut wb = Workbook::new();
    let sheet = wb.add_sheet();
    let own = wb.add_drawing();
    assert_eq!(own.index(), foreign.index());

    let err = wb.sheet_mut(sheet).unwrap().set_drawing(foreign).unwrap_err();
    assert!(matches!(err, Error::DrawingNotFound(id) if id == foreign));
    assert!(matches!(
        wb.link_drawing(foreign_sheet, own),
        Err(Error::SheetNotFound(_))
    ));

    let view = wb.sheet(sheet).unwrap();
    assert_eq!(view.drawing_rel_id(), None);
    assert!(view.relationships().is_empty());
}

/// Sheets are addressed by name case-insensitively for duplicates
#[test]
fn test_sheet_names_are_unique() {
    let mut wb = Workbook::new();
    wb.add_sheet_with_name("Data").unwrap();

    assert!(matches!(
        wb.add_sheet_with_name("DATA"),
        Err(Error::DuplicateSheetName(_))
    ));
    assert!(matches!(
        wb.add_sheet_with_name("bad/name"),
        Err(Error::InvalidSheetName(_))
    ));
    assert_eq!(wb.sheet_count(), 1);
}

/// Renaming into a duplicate is allowed but fails validation
#[test]
fn test_duplicate_name_after_rename_fails_validation() {
    let mut wb = Workbook::new();
    let first = wb.add_sheet();
    wb.add_sheet();
    wb.sheet_mut(first).unwrap().set_name("Sheet2");

    assert_eq!(wb.sheet(first).unwrap().name(), "Sheet2");
    assert_eq!(wb.validate().unwrap_err().path, "workbook/sheets/sheet[2]/name");
}

/// Validation reports the offending element path
#[test]
fn test_validation_reports_path() {
    let mut wb = Workbook::new();
    let id = wb.add_sheet();
    wb.sheet_mut(id).unwrap().set_name("");

    let err = wb.sheet(id).unwrap().validate().unwrap_err();
    assert_eq!(err.path, "sheet/name");

    let err = wb.validate().unwrap_err();
    assert_eq!(err.path, "workbook/sheets/sheet[1]/name");
}

/// Clearing a drawing removes the entry and never reuses its ID
#[test]
fn test_clear_drawing_does_not_reuse_ids() {
    let mut wb = Workbook::new();
    let sheet = wb.add_sheet();
    let drawing = wb.add_drawing();

    wb.sheet_mut(sheet).unwrap().set_drawing(drawing).unwrap();
    let removed = wb.sheet_mut(sheet).unwrap().clear_drawing().unwrap().unwrap();
    assert_eq!(removed.id, "rId1");
    assert_eq!(wb.sheet(sheet).unwrap().drawing(), None);

    let again = wb.sheet_mut(sheet).unwrap().set_drawing(drawing).unwrap();
    assert_eq!(again.id(), "rId2");
}
