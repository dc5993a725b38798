//! Drawing and chart parts
//!
//! A drawing part holds chart anchors. Each anchor points at a chart part
//! through the drawing's own relationship table, the same way a worksheet
//! points at its drawing.

use log::debug;

use crate::error::Result;
use crate::relationship::{DocumentType, RelationshipTable, RelationshipType};
use crate::workbook::{ChartId, DrawingId, Workbook};

/// Cell corner an anchor is attached to (0-based, as in DrawingML)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorCell {
    pub col: u32,
    pub row: u32,
}

impl AnchorCell {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Two-cell anchor placing a chart inside a drawing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartAnchor {
    /// Chart shown by this anchor
    pub chart: ChartId,
    /// Relationship ID in the drawing's relationship table
    pub rel_id: String,
    /// Top-left corner
    pub from: AnchorCell,
    /// Bottom-right corner
    pub to: AnchorCell,
}

/// Drawing part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawingPart {
    anchors: Vec<ChartAnchor>,
}

impl DrawingPart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chart anchors in z-order
    pub fn anchors(&self) -> &[ChartAnchor] {
        &self.anchors
    }

    pub fn push_anchor(&mut self, anchor: ChartAnchor) {
        self.anchors.push(anchor);
    }
}

/// Chart part. Chart contents are opaque at this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartPart {
    pub title: Option<String>,
}

impl ChartPart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Read-only view of a drawing
#[derive(Debug, Clone, Copy)]
pub struct Drawing<'a> {
    workbook: &'a Workbook,
    id: DrawingId,
}

impl<'a> Drawing<'a> {
    /// Caller has checked that `id` is registered in `workbook`.
    pub(crate) fn new(workbook: &'a Workbook, id: DrawingId) -> Self {
        Self { workbook, id }
    }

    pub fn id(&self) -> DrawingId {
        self.id
    }

    /// 1-based position in the workbook's drawing sequence
    pub fn position(&self) -> usize {
        self.id.index() + 1
    }

    pub fn part(&self) -> &'a DrawingPart {
        &self.workbook.drawings[self.id.index()]
    }

    pub fn anchors(&self) -> &'a [ChartAnchor] {
        self.part().anchors()
    }

    /// Relationship table owned by this drawing part
    pub fn relationships(&self) -> &'a RelationshipTable {
        &self.workbook.drawing_rels[self.id.index()]
    }

    /// Charts shown by this drawing, in anchor order
    pub fn charts(&self) -> impl Iterator<Item = ChartId> + 'a {
        self.part().anchors().iter().map(|a| a.chart)
    }
}

/// Mutable view of a drawing
#[derive(Debug)]
pub struct DrawingMut<'a> {
    workbook: &'a mut Workbook,
    id: DrawingId,
}

impl<'a> DrawingMut<'a> {
    /// Caller has checked that `id` is registered in `workbook`.
    pub(crate) fn new(workbook: &'a mut Workbook, id: DrawingId) -> Self {
        Self { workbook, id }
    }

    pub fn id(&self) -> DrawingId {
        self.id
    }

    pub fn as_drawing(&self) -> Drawing<'_> {
        Drawing::new(self.workbook, self.id)
    }

    /// Create a chart part anchored between `from` and `to`
    pub fn add_chart(&mut self, chart: ChartPart, from: AnchorCell, to: AnchorCell) -> ChartId {
        let chart_id = self.workbook.insert_chart_part(chart);
        let index = self.id.index();
        let handle = self.workbook.drawing_rels[index].add_auto_relationship(
            DocumentType::Spreadsheet,
            chart_id.index() + 1,
            RelationshipType::Chart,
        );
        debug!(
            "anchored chart {} in drawing {} as {}",
            chart_id.index() + 1,
            index + 1,
            handle.id()
        );
        self.workbook.drawings[index].push_anchor(ChartAnchor {
            chart: chart_id,
            rel_id: handle.id().to_string(),
            from,
            to,
        });
        chart_id
    }

    /// Anchor an already registered chart in this drawing
    pub fn anchor_chart(&mut self, chart: ChartId, from: AnchorCell, to: AnchorCell) -> Result<()> {
        self.workbook.chart(chart)?;
        let index = self.id.index();
        let handle = self.workbook.drawing_rels[index].add_auto_relationship(
            DocumentType::Spreadsheet,
            chart.index() + 1,
            RelationshipType::Chart,
        );
        self.workbook.drawings[index].push_anchor(ChartAnchor {
            chart,
            rel_id: handle.id().to_string(),
            from,
            to,
        });
        Ok(())
    }
}
