use crate::esc;
use crate::package::{Package, XML_DECL};
use crate::png::png_dimensions;
use crate::xlsx::root_rels;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const EMU_PER_CM: f64 = 360_000.0;

/// A stretch of text with one weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// An in-memory `.docx` document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    body: String,
    images: Vec<Vec<u8>>,
    text: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level 0 is the document title, 1 to 3 the heading levels.
    pub fn add_heading(&mut self, text: &str, level: u8) {
        let style = match level {
            0 => "Title".to_string(),
            n => format!("Heading{}", n.min(3)),
        };
        self.paragraph(Some(&style), &[Run::plain(text)]);
    }

    pub fn add_paragraph(&mut self, text: &str) {
        self.paragraph(None, &[Run::plain(text)]);
    }

    pub fn add_runs(&mut self, runs: &[Run]) {
        self.paragraph(None, runs);
    }

    /// Paragraph without spacing after it, for step lists and log lines.
    pub fn add_compact(&mut self, runs: &[Run]) {
        self.paragraph(Some("NoSpacing"), runs);
    }

    pub fn add_bullet(&mut self, text: &str) {
        self.paragraph(Some("ListBullet"), &[Run::plain(format!("\u{2022} {text}"))]);
    }

    pub fn add_page_break(&mut self) {
        self.body
            .push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    /// Table with a bold header row.
    pub fn add_table<S: AsRef<str>>(&mut self, header: &[S], rows: &[Vec<String>]) {
        let columns = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }
        self.body.push_str(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>"#,
        );
        for _ in 0..columns {
            self.body.push_str(r#"<w:gridCol/>"#);
        }
        self.body.push_str("</w:tblGrid>");

        let header: Vec<String> = header.iter().map(|h| h.as_ref().to_string()).collect();
        if !header.is_empty() {
            self.table_row(&header, columns, true);
        }
        for row in rows {
            self.table_row(row, columns, false);
        }
        self.body.push_str("</w:tbl>");
    }

    /// Inline PNG picture, `width_cm` wide, keeping its aspect ratio.
    pub fn add_picture(&mut self, path: &Path, width_cm: f64) -> Result<()> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let (w, h) = png_dimensions(&bytes)
            .map_err(|e| e.with_context("file", path.display().to_string()))?;
        let cx = (width_cm * EMU_PER_CM).round() as u64;
        let cy = (cx as f64 * f64::from(h) / f64::from(w)).round() as u64;

        self.images.push(bytes);
        let n = self.images.len();
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = write!(
            self.body,
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="{name}"/>"#,
                r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
                r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{n}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="rIdImage{n}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            ),
            cx = cx,
            cy = cy,
            n = n,
            name = esc(&name),
        );
        self.text.push(format!("[image {name}]"));
        Ok(())
    }

    /// Plain text of every paragraph and table row, in order.
    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn package(&self) -> Package {
        let mut package = Package::new();
        package.add("[Content_Types].xml", CONTENT_TYPES);
        package.add("_rels/.rels", root_rels("word/document.xml"));
        package.add("word/document.xml", self.document_xml());
        package.add("word/styles.xml", STYLES);
        package.add("word/_rels/document.xml.rels", self.rels_xml());
        for (i, image) in self.images.iter().enumerate() {
            package.add(format!("word/media/image{}.png", i + 1), image.clone());
        }
        package
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package().to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.package().save(path)
    }

    fn paragraph(&mut self, style: Option<&str>, runs: &[Run]) {
        self.body.push_str("<w:p>");
        if let Some(style) = style {
            let _ = write!(self.body, r#"<w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#);
        }
        for run in runs {
            push_run(&mut self.body, run);
        }
        self.body.push_str("</w:p>");
        self.text
            .push(runs.iter().map(|r| r.text.as_str()).collect::<String>());
    }

    fn table_row(&mut self, cells: &[String], columns: usize, bold: bool) {
        self.body.push_str("<w:tr>");
        for i in 0..columns {
            let text = cells.get(i).map(String::as_str).unwrap_or_default();
            self.body
                .push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr><w:p>"#);
            push_run(
                &mut self.body,
                &Run {
                    text: text.to_string(),
                    bold,
                },
            );
            self.body.push_str("</w:p></w:tc>");
        }
        self.body.push_str("</w:tr>");
        self.text.push(cells.join(" | "));
    }

    fn document_xml(&self) -> String {
        format!(
            concat!(
                "{decl}",
                r#"<w:document xmlns:w="{w}" xmlns:r="{r}" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
                "<w:body>{body}",
                r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
                r#"<w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="709" w:footer="709" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>",
            ),
            decl = XML_DECL,
            w = NS_W,
            r = NS_R,
            body = self.body,
        )
    }

    fn rels_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        let _ = write!(
            xml,
            r#"<Relationship Id="rIdStyles" Type="{NS_R}/styles" Target="styles.xml"/>"#
        );
        for i in 1..=self.images.len() {
            let _ = write!(
                xml,
                r#"<Relationship Id="rIdImage{i}" Type="{NS_R}/image" Target="media/image{i}.png"/>"#
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// One run; line breaks in the text become `<w:br/>`.
fn push_run(out: &mut String, run: &Run) {
    out.push_str("<w:r>");
    if run.bold {
        out.push_str("<w:rPr><w:b/></w:rPr>");
    }
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        let _ = write!(out, r#"<w:t xml:space="preserve">{}</w:t>"#, esc(line));
    }
    out.push_str("</w:r>");
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="png" ContentType="image/png"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"</Types>"#,
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="120"/></w:pPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:rPr><w:b/><w:sz w:val="56"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="480"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="0DA917"/><w:sz w:val="32"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="360"/></w:pPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="NoSpacing"><w:name w:val="No Spacing"/><w:pPr><w:spacing w:after="0"/></w:pPr></w:style>"#,
    r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders>"#,
    r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"</w:tblBorders></w:tblPr></w:style>"#,
    r#"</w:styles>"#,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::read_part;
    use crate::png::tiny_png;

    #[test]
    fn headings_paragraphs_and_runs() {
        let mut doc = Document::new();
        doc.add_heading("Report", 0);
        doc.add_heading("Feature: Login", 1);
        doc.add_runs(&[Run::bold("Given"), Run::plain(" a <user>")]);
        doc.add_bullet("first point");
        doc.add_compact(&[Run::plain("1 step passed")]);
        doc.add_page_break();

        let xml = read_part(&doc.to_bytes().unwrap(), "word/document.xml").unwrap();
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">Given</w:t>"));
        assert!(xml.contains(" a &lt;user&gt;"));
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="NoSpacing"/>"#));
        assert_eq!(
            doc.text(),
            &[
                "Report",
                "Feature: Login",
                "Given a <user>",
                "\u{2022} first point",
                "1 step passed"
            ]
        );
    }

    #[test]
    fn multi_line_text_uses_breaks() {
        let mut doc = Document::new();
        doc.add_paragraph("one\ntwo");
        let xml = doc.document_xml();
        assert!(xml.contains(r#"one</w:t><w:br/><w:t xml:space="preserve">two"#));
    }

    #[test]
    fn tables_pad_short_rows() {
        let mut doc = Document::new();
        doc.add_table(
            &["Feature", "Scenario", "Status"],
            &[vec!["Login".into(), "ok".into()]],
        );
        let xml = doc.document_xml();
        assert_eq!(xml.matches("<w:tc>").count(), 6);
        assert_eq!(xml.matches("<w:gridCol/>").count(), 3);
        assert_eq!(doc.text().last().map(String::as_str), Some("Login | ok"));

        let mut empty = Document::new();
        empty.add_table::<&str>(&[], &[]);
        assert!(empty.text().is_empty());
    }

    #[test]
    fn pictures_are_embedded_with_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, tiny_png(200, 100)).unwrap();

        let mut doc = Document::new();
        doc.add_picture(&path, 18.0).unwrap();
        let bytes = doc.to_bytes().unwrap();

        let xml = read_part(&bytes, "word/document.xml").unwrap();
        assert!(xml.contains(r#"<wp:extent cx="6480000" cy="3240000"/>"#));
        let rels = read_part(&bytes, "word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains(r#"Target="media/image1.png""#));
        assert_eq!(doc.image_count(), 1);

        std::fs::write(&path, "not a png").unwrap();
        assert!(doc.add_picture(&path, 18.0).is_err());
    }
}
