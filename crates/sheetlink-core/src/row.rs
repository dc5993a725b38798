//! Row types

use crate::error::{Error, Result};

/// Highest outline (grouping) level a row may carry
pub const MAX_OUTLINE_LEVEL: u8 = 7;

/// Row record stored inside a worksheet part
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowRecord {
    /// Row number (1-based, assigned on creation)
    pub(crate) number: u32,
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Row is hidden
    pub hidden: bool,
    /// Outline/grouping level (0-7)
    pub outline_level: u8,
    /// Row is collapsed (in outline)
    pub collapsed: bool,
}

impl RowRecord {
    pub(crate) fn new(number: u32) -> Self {
        Self {
            number,
            height: None,
            hidden: false,
            outline_level: 0,
            collapsed: false,
        }
    }

    /// Row number (1-based)
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Check if this row has any custom settings
    pub fn has_custom_settings(&self) -> bool {
        self.height.is_some() || self.hidden || self.outline_level > 0 || self.collapsed
    }
}

/// Read-only view of a row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    record: &'a RowRecord,
}

impl<'a> Row<'a> {
    pub(crate) fn new(record: &'a RowRecord) -> Self {
        Self { record }
    }

    /// Row number (1-based)
    pub fn number(&self) -> u32 {
        self.record.number
    }

    /// Custom height, if set
    pub fn height(&self) -> Option<f64> {
        self.record.height
    }

    pub fn is_hidden(&self) -> bool {
        self.record.hidden
    }

    pub fn outline_level(&self) -> u8 {
        self.record.outline_level
    }

    pub fn is_collapsed(&self) -> bool {
        self.record.collapsed
    }

    /// The underlying record
    pub fn record(&self) -> &'a RowRecord {
        self.record
    }
}

/// Mutable view of a row
#[derive(Debug)]
pub struct RowMut<'a> {
    record: &'a mut RowRecord,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(record: &'a mut RowRecord) -> Self {
        Self { record }
    }

    /// Row number (1-based)
    pub fn number(&self) -> u32 {
        self.record.number
    }

    /// Reborrow as a read-only view
    pub fn as_row(&self) -> Row<'_> {
        Row::new(self.record)
    }

    /// Set a custom height in points, or `None` for the default height
    pub fn set_height(&mut self, height: Option<f64>) -> &mut Self {
        self.record.height = height;
        self
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.record.hidden = hidden;
        self
    }

    /// Set the outline level (0-7)
    pub fn set_outline_level(&mut self, level: u8) -> Result<&mut Self> {
        if level > MAX_OUTLINE_LEVEL {
            return Err(Error::InvalidOutlineLevel(level));
        }
        self.record.outline_level = level;
        Ok(self)
    }

    pub fn set_collapsed(&mut self, collapsed: bool) -> &mut Self {
        self.record.collapsed = collapsed;
        self
    }
}
