//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use log::debug;

use crate::error::XlsxResult;
use sheetlink_core::{
    DocumentType, Drawing, RelationshipTable, RelationshipType, Sheet, Workbook,
};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const C_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.settings().verify_on_save {
            workbook.validate()?;
        }

        let mut zip = zip::ZipWriter::new(writer);

        // Write [Content_Types].xml
        Self::write_content_types(&mut zip, workbook)?;

        // Write _rels/.rels
        let mut root_rels = RelationshipTable::new();
        root_rels.add_auto_relationship(DocumentType::Spreadsheet, 1, RelationshipType::OfficeDocument);
        Self::write_relationships(&mut zip, "_rels/.rels", &root_rels)?;

        // Write xl/workbook.xml and its relationships
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_relationships(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            workbook.workbook_relationships(),
        )?;

        // Write worksheets and their relationships
        for (i, sheet) in workbook.sheets().enumerate() {
            Self::write_worksheet(&mut zip, &sheet, i + 1)?;
            if !sheet.relationships().is_empty() {
                Self::write_relationships(
                    &mut zip,
                    &format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1),
                    sheet.relationships(),
                )?;
            }
        }

        // Write drawings and their relationships
        for id in workbook.drawing_ids() {
            let drawing = workbook.drawing(id)?;
            Self::write_drawing(&mut zip, &drawing)?;
            if !drawing.relationships().is_empty() {
                Self::write_relationships(
                    &mut zip,
                    &format!("xl/drawings/_rels/drawing{}.xml.rels", drawing.position()),
                    drawing.relationships(),
                )?;
            }
        }

        // Write charts
        for i in 0..workbook.chart_count() {
            Self::write_chart(&mut zip, workbook, i + 1)?;
        }

        zip.finish()?;
        debug!(
            "wrote package with {} sheets, {} drawings, {} charts",
            workbook.sheet_count(),
            workbook.drawing_count(),
            workbook.chart_count()
        );
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );

        // Add an override for each worksheet
        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        for i in 0..workbook.drawing_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/drawings/drawing{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>"#,
                i + 1
            ));
        }

        for i in 0..workbook.chart_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/charts/chart{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">
    <sheets>"#
        );

        for sheet in workbook.sheets() {
            let entry = sheet.entry();
            let state = match entry.state() {
                sheetlink_core::SheetState::Visible => String::new(),
                other => format!(r#" state="{}""#, other.as_str()),
            };
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}"{} r:id="{}"/>"#,
                escape_xml(entry.name()),
                entry.sheet_id(),
                state,
                escape_xml(entry.rel_id())
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Write one relationship table as a `.rels` part, IDs verbatim
    fn write_relationships<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        part_name: &str,
        rels: &RelationshipTable,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(part_name.to_string(), options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PKG_REL_NS}">"#
        );

        for rel in rels.iter() {
            content.push_str(&format!(
                r#"
    <Relationship Id="{}" Type="{}" Target="{}"/>"#,
                escape_xml(&rel.id),
                escape_xml(&rel.type_uri),
                escape_xml(&rel.target)
            ));
        }

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Sheet<'_>,
        position: usize,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", position), options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#
        );

        if sheet.row_count() == 0 {
            content.push_str("\n    <sheetData/>");
        } else {
            content.push_str("\n    <sheetData>");
            for row in sheet.rows() {
                let mut attrs = format!(r#" r="{}""#, row.number());
                if let Some(height) = row.height() {
                    attrs.push_str(&format!(r#" ht="{}" customHeight="1""#, height));
                }
                if row.is_hidden() {
                    attrs.push_str(r#" hidden="1""#);
                }
                if row.outline_level() > 0 {
                    attrs.push_str(&format!(r#" outlineLevel="{}""#, row.outline_level()));
                }
                if row.is_collapsed() {
                    attrs.push_str(r#" collapsed="1""#);
                }
                content.push_str(&format!("\n        <row{}/>", attrs));
            }
            content.push_str("\n    </sheetData>");
        }

        if let Some(rel_id) = sheet.drawing_rel_id() {
            content.push_str(&format!(r#"
    <drawing r:id="{}"/>"#, escape_xml(rel_id)));
        }

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_drawing<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        drawing: &Drawing<'_>,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(
            format!("xl/drawings/drawing{}.xml", drawing.position()),
            options,
        )?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="{XDR_NS}" xmlns:a="{A_NS}" xmlns:c="{C_NS}" xmlns:r="{REL_NS}">"#
        );

        for (i, anchor) in drawing.anchors().iter().enumerate() {
            content.push_str(&format!(
                r#"
    <xdr:twoCellAnchor>
        <xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
        <xdr:to><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
        <xdr:graphicFrame macro="">
            <xdr:nvGraphicFramePr><xdr:cNvPr id="{}" name="Chart {}"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr>
            <xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm>
            <a:graphic><a:graphicData uri="{C_NS}"><c:chart r:id="{}"/></a:graphicData></a:graphic>
        </xdr:graphicFrame>
        <xdr:clientData/>
    </xdr:twoCellAnchor>"#,
                anchor.from.col,
                anchor.from.row,
                anchor.to.col,
                anchor.to.row,
                i + 2,
                i + 1,
                escape_xml(&anchor.rel_id)
            ));
        }

        content.push_str("\n</xdr:wsDr>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_chart<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        position: usize,
    ) -> XlsxResult<()> {
        let chart = workbook
            .chart_id_at(position)
            .map(|id| workbook.chart(id))
            .transpose()?
            .cloned()
            .unwrap_or_default();

        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/charts/chart{}.xml", position), options)?;

        let title = match &chart.title {
            Some(title) => format!(
                r#"
        <c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title>
        <c:autoTitleDeleted val="0"/>"#,
                escape_xml(title)
            ),
            None => String::from(
                r#"
        <c:autoTitleDeleted val="1"/>"#,
            ),
        };

        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="{C_NS}" xmlns:a="{A_NS}" xmlns:r="{REL_NS}">
    <c:chart>{title}
        <c:plotArea><c:layout/></c:plotArea>
        <c:plotVisOnly val="1"/>
    </c:chart>
</c:chartSpace>"#
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
