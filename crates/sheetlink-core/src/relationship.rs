//! Per-part relationship tables
//!
//! Every package part that points at other parts owns a [`RelationshipTable`].
//! Entries are addressed by opaque IDs (`rId1`, `rId2`, ...) that are minted
//! from a monotonic counter and never handed out twice, even after an entry
//! has been removed.

use crate::error::{Error, Result};

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Kind of package the relationship lives in.
///
/// Only affects targets that are rooted at the package level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DocumentType {
    Spreadsheet,
    Document,
    Presentation,
}

/// Relationship types that can be registered automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationshipType {
    /// Package root -> main document part
    OfficeDocument,
    /// Workbook -> worksheet
    Worksheet,
    /// Worksheet -> drawing
    Drawing,
    /// Drawing -> chart
    Chart,
}

impl RelationshipType {
    const ALL: [RelationshipType; 4] = [
        RelationshipType::OfficeDocument,
        RelationshipType::Worksheet,
        RelationshipType::Drawing,
        RelationshipType::Chart,
    ];

    /// OPC relationship type URI
    pub fn uri(self) -> &'static str {
        match self {
            RelationshipType::OfficeDocument => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"
            }
            RelationshipType::Worksheet => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"
            }
            RelationshipType::Drawing => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing"
            }
            RelationshipType::Chart => {
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart"
            }
        }
    }

    /// Parse a relationship type URI
    pub fn from_uri(uri: &str) -> Option<Self> {
        if !uri.starts_with(REL_NS) {
            return None;
        }
        Self::ALL.into_iter().find(|t| t.uri() == uri)
    }

    /// File stem of the numbered part this type points at (`drawing` for
    /// `drawing3.xml`), if the target is numbered.
    pub fn part_stem(self) -> Option<&'static str> {
        match self {
            RelationshipType::OfficeDocument => None,
            RelationshipType::Worksheet => Some("sheet"),
            RelationshipType::Drawing => Some("drawing"),
            RelationshipType::Chart => Some("chart"),
        }
    }

    /// Target locator for the `index`-th (1-based) part of this type,
    /// relative to the part that owns the relationship.
    pub fn target_for(self, doc_type: DocumentType, index: usize) -> String {
        match (self, doc_type) {
            (RelationshipType::OfficeDocument, DocumentType::Spreadsheet) => {
                "xl/workbook.xml".to_string()
            }
            (RelationshipType::OfficeDocument, DocumentType::Document) => {
                "word/document.xml".to_string()
            }
            (RelationshipType::OfficeDocument, DocumentType::Presentation) => {
                "ppt/presentation.xml".to_string()
            }
            (RelationshipType::Worksheet, _) => format!("worksheets/sheet{index}.xml"),
            (RelationshipType::Drawing, _) => format!("../drawings/drawing{index}.xml"),
            (RelationshipType::Chart, DocumentType::Spreadsheet) => {
                format!("../charts/chart{index}.xml")
            }
            (RelationshipType::Chart, _) => format!("charts/chart{index}.xml"),
        }
    }
}

/// Extract the 1-based position encoded in a numbered part target
/// (`../drawings/drawing3.xml` with stem `drawing` gives 3).
pub fn target_position(target: &str, stem: &str) -> Option<usize> {
    let file_name = target.rsplit('/').next()?;
    let digits = file_name.strip_prefix(stem)?.strip_suffix(".xml")?;
    match digits.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// One entry of a relationship table
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relationship {
    /// Relationship ID, unique within its table
    pub id: String,
    /// Relationship type URI
    pub type_uri: String,
    /// Target locator, relative to the owning part
    pub target: String,
}

impl Relationship {
    /// Known relationship type, if the URI is one this crate models
    pub fn kind(&self) -> Option<RelationshipType> {
        RelationshipType::from_uri(&self.type_uri)
    }

    /// Whether this relationship has the given type
    pub fn is(&self, rel_type: RelationshipType) -> bool {
        self.type_uri == rel_type.uri()
    }

    /// 1-based position of the targeted part within its sequence
    pub fn target_position(&self) -> Option<usize> {
        let stem = self.kind()?.part_stem()?;
        target_position(&self.target, stem)
    }
}

/// Handle to a freshly registered relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipHandle {
    id: String,
}

impl RelationshipHandle {
    /// The minted relationship ID
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Relationship table owned by one package part
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationshipTable {
    entries: Vec<Relationship>,
    /// Next numeric suffix to try when minting an ID
    next_id: u64,
}

impl RelationshipTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Register a relationship to the `index`-th (1-based) part of
    /// `target_type` and return a handle carrying its new ID.
    ///
    /// The caller is responsible for `index` matching the target's real
    /// position; the table has no way to check it.
    pub fn add_auto_relationship(
        &mut self,
        doc_type: DocumentType,
        index: usize,
        target_type: RelationshipType,
    ) -> RelationshipHandle {
        let id = self.mint_id();
        self.entries.push(Relationship {
            id: id.clone(),
            type_uri: target_type.uri().to_string(),
            target: target_type.target_for(doc_type, index),
        });
        RelationshipHandle { id }
    }

    /// Insert an entry with a known ID, as read from an existing package.
    ///
    /// Later minted IDs skip past every numeric `rIdN` inserted here. Suffixes
    /// wider than 32 bits do not move the counter; minting still skips them.
    pub fn insert_existing<I, T, G>(&mut self, id: I, type_uri: T, target: G) -> Result<()>
    where
        I: Into<String>,
        T: Into<String>,
        G: Into<String>,
    {
        let id = id.into();
        if self.contains(&id) {
            return Err(Error::DuplicateRelationshipId(id));
        }
        if let Some(n) = id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
            self.next_id = self.next_id.max(u64::from(n) + 1);
        }
        self.entries.push(Relationship {
            id,
            type_uri: type_uri.into(),
            target: target.into(),
        });
        Ok(())
    }

    /// Remove an entry. Its ID is never minted again.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.entries.iter().position(|r| r.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Look up an entry by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Check whether an ID is present
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn mint_id(&mut self) -> String {
        loop {
            let candidate = format!("rId{}", self.next_id);
            self.next_id = self.next_id.saturating_add(1);
            if !self.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for RelationshipTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut rels = RelationshipTable::new();
        let a = rels.add_auto_relationship(DocumentType::Spreadsheet, 1, RelationshipType::Drawing);
        let b = rels.add_auto_relationship(DocumentType::Spreadsheet, 2, RelationshipType::Drawing);
        assert_eq!(a.id(), "rId1");
        assert_eq!(b.id(), "rId2");
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_drawing_target() {
        let mut rels = RelationshipTable::new();
        let h = rels.add_auto_relationship(DocumentType::Spreadsheet, 3, RelationshipType::Drawing);
        let rel = rels.get(h.id()).unwrap();
        assert_eq!(rel.target, "../drawings/drawing3.xml");
        assert_eq!(rel.kind(), Some(RelationshipType::Drawing));
        assert_eq!(rel.target_position(), Some(3));
    }

    #[test]
    fn test_removed_id_not_reused() {
        let mut rels = RelationshipTable::new();
        let a = rels.add_auto_relationship(DocumentType::Spreadsheet, 1, RelationshipType::Worksheet);
        assert!(rels.remove(a.id()).is_some());
        let b = rels.add_auto_relationship(DocumentType::Spreadsheet, 1, RelationshipType::Worksheet);
        assert_eq!(b.id(), "rId2");
        assert!(rels.get("rId1").is_none());
    }

    #[test]
    fn test_insert_existing_advances_counter() {
        let mut rels = RelationshipTable::new();
        rels.insert_existing("rId7", RelationshipType::Drawing.uri(), "../drawings/drawing1.xml")
            .unwrap();
        rels.insert_existing("custom", "urn:other", "x.xml").unwrap();
        let h = rels.add_auto_relationship(DocumentType::Spreadsheet, 2, RelationshipType::Drawing);
        assert_eq!(h.id(), "rId8");
    }

    #[test]
    fn test_minting_after_largest_id() {
        let mut rels = RelationshipTable::new();
        rels.insert_existing("rId4294967295", RelationshipType::Drawing.uri(), "../drawings/drawing1.xml")
            .unwrap();
        rels.insert_existing("rId99999999999", RelationshipType::Drawing.uri(), "../drawings/drawing1.xml")
            .unwrap();

        let a = rels.add_auto_relationship(DocumentType::Spreadsheet, 1, RelationshipType::Drawing);
        let b = rels.add_auto_relationship(DocumentType::Spreadsheet, 2, RelationshipType::Drawing);
        assert_eq!(a.id(), "rId4294967296");
        assert_eq!(b.id(), "rId4294967297");
        assert_eq!(rels.len(), 4);
    }

    #[test]
    fn test_insert_existing_rejects_duplicates() {
        let mut rels = RelationshipTable::new();
        rels.insert_existing("rId1", "urn:a", "a.xml").unwrap();
        assert!(matches!(
            rels.insert_existing("rId1", "urn:b", "b.xml"),
            Err(Error::DuplicateRelationshipId(_))
        ));
    }

    #[test]
    fn test_minting_skips_taken_ids() {
        let mut rels = RelationshipTable::new();
        rels.insert_existing("rId1", "urn:a", "a.xml").unwrap();
        rels.remove("rId1");
        rels.insert_existing("rId2x", "urn:a", "a.xml").unwrap();
        let h = rels.add_auto_relationship(DocumentType::Spreadsheet, 1, RelationshipType::Chart);
        assert_eq!(h.id(), "rId2");
    }

    #[test]
    fn test_target_position() {
        assert_eq!(target_position("../drawings/drawing12.xml", "drawing"), Some(12));
        assert_eq!(target_position("worksheets/sheet1.xml", "sheet"), Some(1));
        assert_eq!(target_position("../drawings/drawing0.xml", "drawing"), None);
        assert_eq!(target_position("../drawings/vmlDrawing1.vml", "drawing"), None);
        assert_eq!(target_position("../charts/chart1.xml", "drawing"), None);
    }

    #[test]
    fn test_type_uri_roundtrip() {
        for t in RelationshipType::ALL {
            assert_eq!(RelationshipType::from_uri(t.uri()), Some(t));
        }
        assert_eq!(
            RelationshipType::from_uri(
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments"
            ),
            None
        );
    }

    #[test]
    fn test_office_document_target_by_doc_type() {
        let t = RelationshipType::OfficeDocument;
        assert_eq!(t.target_for(DocumentType::Spreadsheet, 1), "xl/workbook.xml");
        assert_eq!(t.target_for(DocumentType::Document, 1), "word/document.xml");
        assert_eq!(RelationshipType::Chart.target_for(DocumentType::Document, 2), "charts/chart2.xml");
    }
}
