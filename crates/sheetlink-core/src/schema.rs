//! Schema validation for package parts
//!
//! Validation reports the first violated constraint as a [`ValidationError`]
//! carrying a path to the offending element. It never mutates the model.

use thiserror::Error;

use crate::relationship::Relationship;
use crate::row::{RowRecord, MAX_OUTLINE_LEVEL};
use crate::sheet::SheetEntry;
use crate::worksheet::WorksheetPart;
use crate::{MAX_ROWS, MAX_ROW_HEIGHT, MAX_SHEET_NAME_LEN};

/// First schema violation found
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// Location of the offending element or attribute
    pub path: String,
    /// What was violated
    pub message: String,
}

impl ValidationError {
    pub fn new<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Schema validation entry point
pub trait Validate {
    /// Element name used as the root of error paths
    const ELEMENT: &'static str;

    /// Validate, reporting errors relative to [`Validate::ELEMENT`]
    fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with_path(Self::ELEMENT)
    }

    /// Validate, reporting errors relative to `path`
    fn validate_with_path(&self, path: &str) -> Result<(), ValidationError>;
}

/// Characters Excel refuses in sheet names
const INVALID_SHEET_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// Check a sheet name against the SpreadsheetML naming rules.
///
/// Returns a description of the first broken rule.
pub fn check_sheet_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Sheet name cannot be empty".into());
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(format!(
            "Sheet name too long (max {} characters)",
            MAX_SHEET_NAME_LEN
        ));
    }
    for c in INVALID_SHEET_NAME_CHARS {
        if name.contains(*c) {
            return Err(format!("Sheet name cannot contain '{}'", c));
        }
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err("Sheet name cannot begin or end with an apostrophe".into());
    }
    Ok(())
}

impl Validate for SheetEntry {
    const ELEMENT: &'static str = "sheet";

    fn validate_with_path(&self, path: &str) -> Result<(), ValidationError> {
        check_sheet_name(self.name())
            .map_err(|msg| ValidationError::new(format!("{path}/name"), msg))?;
        if self.sheet_id() == 0 {
            return Err(ValidationError::new(
                format!("{path}/sheetId"),
                "sheetId must be at least 1",
            ));
        }
        if self.rel_id().is_empty() {
            return Err(ValidationError::new(
                format!("{path}/r:id"),
                "relationship ID is required",
            ));
        }
        Ok(())
    }
}

impl Validate for RowRecord {
    const ELEMENT: &'static str = "row";

    fn validate_with_path(&self, path: &str) -> Result<(), ValidationError> {
        if self.number() == 0 || self.number() > MAX_ROWS {
            return Err(ValidationError::new(
                format!("{path}/r"),
                format!("row number {} outside 1..={}", self.number(), MAX_ROWS),
            ));
        }
        if let Some(height) = self.height {
            if !(0.0..=MAX_ROW_HEIGHT).contains(&height) {
                return Err(ValidationError::new(
                    format!("{path}/ht"),
                    format!("row height {height} outside 0..={MAX_ROW_HEIGHT}"),
                ));
            }
        }
        if self.outline_level > MAX_OUTLINE_LEVEL {
            return Err(ValidationError::new(
                format!("{path}/outlineLevel"),
                format!("outline level {} exceeds {}", self.outline_level, MAX_OUTLINE_LEVEL),
            ));
        }
        Ok(())
    }
}

impl Validate for WorksheetPart {
    const ELEMENT: &'static str = "worksheet";

    fn validate_with_path(&self, path: &str) -> Result<(), ValidationError> {
        for (i, row) in self.row_records().iter().enumerate() {
            let row_path = format!("{path}/sheetData/row[{}]", i + 1);
            row.validate_with_path(&row_path)?;
            if row.number() as usize != i + 1 {
                return Err(ValidationError::new(
                    format!("{row_path}/r"),
                    format!("expected row {}, found {}", i + 1, row.number()),
                ));
            }
        }
        if let Some(drawing) = self.drawing() {
            if drawing.rel_id().is_empty() {
                return Err(ValidationError::new(
                    format!("{path}/drawing/r:id"),
                    "relationship ID is required",
                ));
            }
        }
        Ok(())
    }
}

impl Validate for Relationship {
    const ELEMENT: &'static str = "Relationship";

    fn validate_with_path(&self, path: &str) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::new(format!("{path}/Id"), "Id is required"));
        }
        if self.type_uri.is_empty() {
            return Err(ValidationError::new(format!("{path}/Type"), "Type is required"));
        }
        if self.target.is_empty() {
            return Err(ValidationError::new(
                format!("{path}/Target"),
                "Target is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_sheet_name() {
        assert!(check_sheet_name("Data").is_ok());
        assert!(check_sheet_name("Q1 & Q2 <draft>").is_ok());
        assert!(check_sheet_name("").is_err());
        assert!(check_sheet_name("Sheet/1").is_err());
        assert!(check_sheet_name("Sheet:1").is_err());
        assert!(check_sheet_name("Sheet[1]").is_err());
        assert!(check_sheet_name("'quoted'").is_err());
        assert!(check_sheet_name(&"A".repeat(MAX_SHEET_NAME_LEN + 1)).is_err());
        assert!(check_sheet_name(&"é".repeat(MAX_SHEET_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_sheet_entry_paths() {
        let entry = SheetEntry::new("Bad?", 1, "rId1");
        let err = entry.validate().unwrap_err();
        assert_eq!(err.path, "sheet/name");

        let err = entry.validate_with_path("workbook/sheets/sheet[2]").unwrap_err();
        assert_eq!(err.path, "workbook/sheets/sheet[2]/name");
        assert!(err.to_string().starts_with("workbook/sheets/sheet[2]/name: "));
    }

    #[test]
    fn test_sheet_entry_requires_ids() {
        assert_eq!(
            SheetEntry::new("A", 0, "rId1").validate().unwrap_err().path,
            "sheet/sheetId"
        );
        assert_eq!(
            SheetEntry::new("A", 1, "").validate().unwrap_err().path,
            "sheet/r:id"
        );
        assert!(SheetEntry::new("A", 1, "rId1").validate().is_ok());
    }

    #[test]
    fn test_worksheet_row_constraints() {
        let mut part = WorksheetPart::new();
        part.add_row();
        part.add_row().set_height(Some(500.0));
        let err = part.validate().unwrap_err();
        assert_eq!(err.path, "worksheet/sheetData/row[2]/ht");

        part.row_mut(2).unwrap().set_height(Some(20.0));
        assert!(part.validate().is_ok());
    }

    #[test]
    fn test_relationship_requires_target() {
        let rel = Relationship {
            id: "rId1".into(),
            type_uri: "urn:x".into(),
            target: String::new(),
        };
        assert_eq!(rel.validate().unwrap_err().path, "Relationship/Target");
    }
}
