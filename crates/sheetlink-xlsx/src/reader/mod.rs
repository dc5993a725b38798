//! XLSX reader
//!
//! Reads sheets, rows, drawing references, drawings and charts back into a
//! [`Workbook`]. Relationship IDs are kept as found. Worksheet, drawing and
//! chart parts are renumbered by their position, and relationship targets are
//! rewritten to match, so a package written by another producer comes back
//! with the same target-encodes-position invariant the model relies on.
//! Relationships to parts this crate does not model are dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::path::{part_number, rels_for_part, resolve_target};
use sheetlink_core::{
    AnchorCell, ChartAnchor, ChartId, ChartPart, DocumentType, DrawingPart, DrawingRef,
    Relationship, RelationshipTable, RelationshipType, SheetEntry, SheetState, Workbook,
    WorksheetPart,
};

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Sheet registry entry as found in the workbook part
#[derive(Debug)]
struct SheetInfo {
    name: String,
    sheet_id: u32,
    rel_id: String,
    state: SheetState,
}

/// Worksheet part with the name it was read from
#[derive(Debug)]
struct ParsedWorksheet {
    part_name: String,
    part: WorksheetPart,
    rels: Vec<Relationship>,
}

/// Anchor as found in a drawing part, before chart resolution
#[derive(Debug, Default)]
struct RawAnchor {
    from: AnchorCell,
    to: AnchorCell,
    rel_id: Option<String>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an OPC package
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let workbook_part = Self::find_workbook_part(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive, &workbook_part)?;
        let workbook_rels = Self::read_relationships(&mut archive, &rels_for_part(&workbook_part))?
            .ok_or_else(|| XlsxError::MissingPart(rels_for_part(&workbook_part)))?;

        // Read each worksheet with its relationships
        let mut worksheets = Vec::with_capacity(sheet_info.len());
        for info in &sheet_info {
            let rel = workbook_rels
                .iter()
                .find(|r| r.id == info.rel_id && r.is(RelationshipType::Worksheet))
                .ok_or_else(|| {
                    XlsxError::InvalidFormat(format!(
                        "sheet '{}' refers to missing worksheet relationship {}",
                        info.name, info.rel_id
                    ))
                })?;
            let part_name = resolve_target(&workbook_part, &rel.target);
            let part = Self::read_worksheet(&mut archive, &part_name)?;
            let rels = Self::read_relationships(&mut archive, &rels_for_part(&part_name))?
                .unwrap_or_default();
            worksheets.push(ParsedWorksheet {
                part_name,
                part,
                rels,
            });
        }

        let file_names: Vec<String> = archive.file_names().map(str::to_string).collect();

        // Drawings: every drawing part referenced by a sheet or present in the package
        let mut drawing_names: Vec<String> = worksheets
            .iter()
            .flat_map(|ws| {
                ws.rels
                    .iter()
                    .filter(|r| r.is(RelationshipType::Drawing))
                    .map(|r| resolve_target(&ws.part_name, &r.target))
            })
            .collect();
        drawing_names.extend(numbered_parts(&file_names, "xl/drawings/", "drawing"));
        let drawing_names = order_parts(drawing_names);

        let mut drawing_rels = Vec::with_capacity(drawing_names.len());
        for name in &drawing_names {
            let rels = Self::read_relationships(&mut archive, &rels_for_part(name))?
                .unwrap_or_default();
            drawing_rels.push(rels);
        }

        // Charts: every chart part referenced by a drawing or present in the package
        let mut chart_names: Vec<String> = drawing_names
            .iter()
            .zip(&drawing_rels)
            .flat_map(|(name, rels)| {
                rels.iter()
                    .filter(|r| r.is(RelationshipType::Chart))
                    .map(move |r| resolve_target(name, &r.target))
            })
            .collect();
        chart_names.extend(numbered_parts(&file_names, "xl/charts/", "chart"));
        let chart_names = order_parts(chart_names);

        let mut workbook = Workbook::new();

        let mut chart_ids: HashMap<&str, ChartId> = HashMap::new();
        for name in &chart_names {
            let chart = Self::read_chart(&mut archive, name)?;
            chart_ids.insert(name.as_str(), workbook.insert_chart_part(chart));
        }

        let mut drawing_positions: HashMap<&str, usize> = HashMap::new();
        for (i, (name, rels)) in drawing_names.iter().zip(&drawing_rels).enumerate() {
            let raw_anchors = Self::read_drawing(&mut archive, name)?;
            let (part, table) = Self::assemble_drawing(name, raw_anchors, rels, &chart_ids)?;
            workbook.insert_drawing_part(part, table);
            drawing_positions.insert(name.as_str(), i + 1);
        }

        // Workbook relationships: one worksheet relationship per sheet, in sheet order
        for rel in &workbook_rels {
            match sheet_info.iter().position(|s| s.rel_id == rel.id) {
                Some(i) if rel.is(RelationshipType::Worksheet) => {
                    workbook.workbook_relationships_mut().insert_existing(
                        rel.id.clone(),
                        rel.type_uri.clone(),
                        RelationshipType::Worksheet.target_for(DocumentType::Spreadsheet, i + 1),
                    )?;
                }
                _ => debug!("dropping workbook relationship {} ({})", rel.id, rel.type_uri),
            }
        }

        for (info, parsed) in sheet_info.into_iter().zip(worksheets) {
            let ParsedWorksheet {
                part_name,
                mut part,
                rels,
            } = parsed;

            let mut table = RelationshipTable::new();
            for rel in &rels {
                if !rel.is(RelationshipType::Drawing) {
                    debug!("dropping relationship {} of {} ({})", rel.id, part_name, rel.type_uri);
                    continue;
                }
                let target = resolve_target(&part_name, &rel.target);
                if let Some(&position) = drawing_positions.get(target.as_str()) {
                    table.insert_existing(
                        rel.id.clone(),
                        rel.type_uri.clone(),
                        RelationshipType::Drawing.target_for(DocumentType::Spreadsheet, position),
                    )?;
                }
            }

            let dangling = part
                .drawing()
                .is_some_and(|d| !table.contains(d.rel_id()));
            if dangling {
                warn!("{} refers to a drawing relationship that cannot be resolved", part_name);
                part.replace_drawing(None);
            }

            let mut entry = SheetEntry::new(info.name, info.sheet_id, info.rel_id);
            entry.set_state(info.state);
            workbook.insert_sheet_part(entry, part, table);
        }

        debug!(
            "read package with {} sheets, {} drawings, {} charts",
            workbook.sheet_count(),
            workbook.drawing_count(),
            workbook.chart_count()
        );
        Ok(workbook)
    }

    /// Locate the main workbook part through the package relationships
    fn find_workbook_part<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<String> {
        let rels = Self::read_relationships(archive, "_rels/.rels")?.unwrap_or_default();
        Ok(rels
            .iter()
            .find(|r| r.is(RelationshipType::OfficeDocument))
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()))
    }

    /// Read workbook.xml to get the sheet registry
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part_name: &str,
    ) -> XlsxResult<Vec<SheetInfo>> {
        let bytes = read_part(archive, part_name)?
            .ok_or_else(|| XlsxError::MissingPart(part_name.to_string()))?;

        let mut xml_reader = Reader::from_reader(bytes.as_slice());
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut sheet_id = None;
                    let mut rel_id = None;
                    let mut state = SheetState::Visible;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.local_name().as_ref() {
                            b"name" => name = value,
                            b"sheetId" => sheet_id = value.and_then(|s| s.parse::<u32>().ok()),
                            b"id" => rel_id = value,
                            b"state" => {
                                state = value
                                    .as_deref()
                                    .and_then(SheetState::parse)
                                    .unwrap_or_default();
                            }
                            _ => {}
                        }
                    }

                    match (name, sheet_id, rel_id) {
                        (Some(name), Some(sheet_id), Some(rel_id)) => sheets.push(SheetInfo {
                            name,
                            sheet_id,
                            rel_id,
                            state,
                        }),
                        _ => {
                            return Err(XlsxError::Parse(format!(
                                "<sheet> #{} in {} is missing name, sheetId or r:id",
                                sheets.len() + 1,
                                part_name
                            )))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read a `.rels` part. Returns `None` if the part is absent.
    fn read_relationships<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part_name: &str,
    ) -> XlsxResult<Option<Vec<Relationship>>> {
        let Some(bytes) = read_part(archive, part_name)? else {
            return Ok(None);
        };

        let mut xml_reader = Reader::from_reader(bytes.as_slice());
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            b"Type" => rel_type = value,
                            b"TargetMode" => {
                                external = value.is_some_and(|m| m.eq_ignore_ascii_case("External"))
                            }
                            _ => {}
                        }
                    }

                    match (id, rel_type, target) {
                        (Some(id), Some(type_uri), Some(target)) if !external => {
                            rels.push(Relationship {
                                id,
                                type_uri,
                                target,
                            })
                        }
                        (Some(id), _, _) => debug!("skipping relationship {} in {}", id, part_name),
                        _ => warn!("skipping relationship without Id in {}", part_name),
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Some(rels))
    }

    /// Read a worksheet's rows and drawing reference
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part_name: &str,
    ) -> XlsxResult<WorksheetPart> {
        let bytes = read_part(archive, part_name)?
            .ok_or_else(|| XlsxError::MissingPart(part_name.to_string()))?;

        let mut xml_reader = Reader::from_reader(bytes.as_slice());
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut part = WorksheetPart::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"row" => Self::read_row(&e, &mut part, part_name)?,
                    b"drawing" => {
                        let rel_id = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.local_name().as_ref() == b"id")
                            .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()));
                        if let Some(rel_id) = rel_id {
                            part.replace_drawing(Some(DrawingRef::new(rel_id)));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(part)
    }

    /// Append one `<row>`, padding with default rows up to its `r` number
    fn read_row(e: &BytesStart<'_>, part: &mut WorksheetPart, part_name: &str) -> XlsxResult<()> {
        let mut number: Option<u32> = None;
        let mut height: Option<f64> = None;
        let mut hidden = false;
        let mut outline_level = 0u8;
        let mut collapsed = false;

        for attr in e.attributes().flatten() {
            let Ok(value) = attr.unescape_value() else {
                continue;
            };
            match attr.key.as_ref() {
                b"r" => number = value.parse().ok(),
                b"ht" => height = value.parse().ok(),
                b"hidden" => hidden = is_true(&value),
                b"outlineLevel" => outline_level = value.parse().unwrap_or(0),
                b"collapsed" => collapsed = is_true(&value),
                _ => {}
            }
        }

        let next = part.row_count() as u32 + 1;
        let number = number.unwrap_or(next);
        if number < next {
            return Err(XlsxError::Parse(format!(
                "row {} in {} is out of order (expected at least {})",
                number, part_name, next
            )));
        }
        if number > sheetlink_core::MAX_ROWS {
            return Err(XlsxError::Parse(format!(
                "row {} in {} exceeds the row limit",
                number, part_name
            )));
        }
        while (part.row_count() as u32) + 1 < number {
            part.add_row();
        }

        let mut row = part.add_row();
        row.set_height(height).set_hidden(hidden).set_collapsed(collapsed);
        row.set_outline_level(outline_level)?;
        Ok(())
    }

    /// Read the chart anchors of a drawing part
    fn read_drawing<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part_name: &str,
    ) -> XlsxResult<Vec<RawAnchor>> {
        let bytes = read_part(archive, part_name)?
            .ok_or_else(|| XlsxError::MissingPart(part_name.to_string()))?;

        let mut xml_reader = Reader::from_reader(bytes.as_slice());
        xml_reader.trim_text(true);

        #[derive(Clone, Copy)]
        enum Corner {
            From,
            To,
        }
        #[derive(Clone, Copy)]
        enum Field {
            Col,
            Row,
        }

        let mut buf = Vec::new();
        let mut anchors = Vec::new();
        let mut current: Option<RawAnchor> = None;
        let mut corner: Option<Corner> = None;
        let mut field: Option<Field> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"twoCellAnchor" => current = Some(RawAnchor::default()),
                    b"from" => corner = Some(Corner::From),
                    b"to" => corner = Some(Corner::To),
                    b"col" => field = Some(Field::Col),
                    b"row" => field = Some(Field::Row),
                    b"chart" => Self::read_chart_ref(&e, current.as_mut()),
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"chart" => {
                    Self::read_chart_ref(&e, current.as_mut())
                }
                Ok(Event::Text(e)) => {
                    if let (Some(anchor), Some(corner), Some(field)) = (current.as_mut(), corner, field) {
                        let value: u32 = e
                            .unescape()
                            .ok()
                            .and_then(|s| s.trim().parse().ok())
                            .ok_or_else(|| {
                                XlsxError::Parse(format!("invalid anchor cell in {}", part_name))
                            })?;
                        let cell = match corner {
                            Corner::From => &mut anchor.from,
                            Corner::To => &mut anchor.to,
                        };
                        match field {
                            Field::Col => cell.col = value,
                            Field::Row => cell.row = value,
                        }
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"col" | b"row" => field = None,
                    b"from" | b"to" => corner = None,
                    b"twoCellAnchor" => {
                        if let Some(anchor) = current.take() {
                            anchors.push(anchor);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(anchors)
    }

    fn read_chart_ref(e: &BytesStart<'_>, anchor: Option<&mut RawAnchor>) {
        let Some(anchor) = anchor else {
            return;
        };
        anchor.rel_id = e
            .attributes()
            .flatten()
            .find(|a| a.key.local_name().as_ref() == b"id")
            .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()));
    }

    /// Resolve anchors to charts and rebuild the drawing's relationship table
    fn assemble_drawing(
        part_name: &str,
        raw_anchors: Vec<RawAnchor>,
        rels: &[Relationship],
        chart_ids: &HashMap<&str, ChartId>,
    ) -> XlsxResult<(DrawingPart, RelationshipTable)> {
        let mut table = RelationshipTable::new();
        for rel in rels {
            if !rel.is(RelationshipType::Chart) {
                debug!("dropping relationship {} of {} ({})", rel.id, part_name, rel.type_uri);
                continue;
            }
            let target = resolve_target(part_name, &rel.target);
            if let Some(chart) = chart_ids.get(target.as_str()) {
                table.insert_existing(
                    rel.id.clone(),
                    rel.type_uri.clone(),
                    RelationshipType::Chart.target_for(DocumentType::Spreadsheet, chart.index() + 1),
                )?;
            }
        }

        let mut part = DrawingPart::new();
        for raw in raw_anchors {
            let Some(rel_id) = raw.rel_id else {
                debug!("skipping non-chart anchor in {}", part_name);
                continue;
            };
            let chart = table
                .get(&rel_id)
                .and_then(|rel| rel.target_position())
                .and_then(|position| chart_ids.values().find(|id| id.index() + 1 == position))
                .copied();
            match chart {
                Some(chart) => part.push_anchor(ChartAnchor {
                    chart,
                    rel_id,
                    from: raw.from,
                    to: raw.to,
                }),
                None => warn!("{} anchors unresolved chart relationship {}", part_name, rel_id),
            }
        }
        Ok((part, table))
    }

    /// Read a chart part. Only the chart title is kept.
    fn read_chart<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part_name: &str,
    ) -> XlsxResult<ChartPart> {
        let bytes = read_part(archive, part_name)?
            .ok_or_else(|| XlsxError::MissingPart(part_name.to_string()))?;

        let mut xml_reader = Reader::from_reader(bytes.as_slice());
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut depth_in_plot_area = 0usize;
        let mut in_title = false;
        let mut in_text = false;
        let mut title: Option<String> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"plotArea" => depth_in_plot_area += 1,
                    b"title" if depth_in_plot_area == 0 => in_title = true,
                    b"t" if in_title => in_text = true,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_text => {
                    if let Ok(text) = e.unescape() {
                        title.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"plotArea" => depth_in_plot_area = depth_in_plot_area.saturating_sub(1),
                    b"title" => in_title = false,
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(ChartPart { title })
    }
}

/// Read a whole part into memory. Returns `None` if the part is absent.
fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    part_name: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(part_name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// Numbered parts like `xl/drawings/drawing3.xml` present in the package
fn numbered_parts<'a>(
    file_names: &'a [String],
    dir: &'a str,
    stem: &'a str,
) -> impl Iterator<Item = String> + 'a {
    file_names
        .iter()
        .filter(move |name| {
            name.strip_prefix(dir)
                .and_then(|file| file.strip_prefix(stem))
                .is_some_and(|rest| !rest.contains('/') && rest.ends_with(".xml"))
        })
        .cloned()
}

/// Deduplicate part names and order them by numeric suffix
fn order_parts(mut names: Vec<String>) -> Vec<String> {
    names.sort_by(|a, b| part_number(a).cmp(&part_number(b)).then_with(|| a.cmp(b)));
    names.dedup();
    names
}

fn is_true(value: &str) -> bool {
    value == "1" || value == "true"
}
