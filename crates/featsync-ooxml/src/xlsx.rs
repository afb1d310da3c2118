use crate::esc;
use crate::package::{Package, XML_DECL};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME: usize = 31;

/// Cell formats known to the stylesheet, in `cellXfs` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Default,
    /// Bold on a green fill.
    Header,
    /// Large bold on a green fill.
    Title,
    /// Red fill, for failed results.
    Fail,
    /// Wrapped, top aligned.
    Wrap,
    /// Blue underlined, for hyperlinks.
    Link,
}

impl Style {
    fn index(self) -> usize {
        match self {
            Self::Default => 0,
            Self::Header => 1,
            Self::Title => 2,
            Self::Fail => 3,
            Self::Wrap => 4,
            Self::Link => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub style: Style,
}

#[derive(Debug, Clone)]
enum LinkTarget {
    External(String),
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<(u32, u16, u32, u16)>,
    links: Vec<(u32, u16, LinkTarget, String)>,
    widths: BTreeMap<u16, f64>,
}

impl Worksheet {
    fn new(name: String) -> Self {
        Self {
            name,
            cells: BTreeMap::new(),
            merges: Vec::new(),
            links: Vec::new(),
            widths: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write text at a zero-based `(row, col)`.
    pub fn write(&mut self, row: u32, col: u16, text: impl Into<String>, style: Style) {
        self.cells.insert(
            (row, col),
            Cell {
                text: text.into(),
                style,
            },
        );
    }

    /// Hyperlink to a URL or a path relative to the workbook.
    pub fn write_url(&mut self, row: u32, col: u16, target: &str, text: &str) {
        self.write(row, col, text, Style::Link);
        self.links
            .push((row, col, LinkTarget::External(target.to_string()), text.to_string()));
    }

    /// Hyperlink to a place inside the workbook, such as `'Summary'!A1`.
    pub fn write_internal_link(&mut self, row: u32, col: u16, location: &str, text: &str) {
        self.write(row, col, text, Style::Link);
        self.links
            .push((row, col, LinkTarget::Internal(location.to_string()), text.to_string()));
    }

    /// Merge a range and write `text` in its top-left cell.
    ///
    /// An existing top-left value is kept when `text` is `None`.
    pub fn merge(
        &mut self,
        first: (u32, u16),
        last: (u32, u16),
        text: Option<&str>,
        style: Style,
    ) {
        match text {
            Some(text) => self.write(first.0, first.1, text, style),
            None => {
                let cell = self.cells.entry(first).or_insert_with(|| Cell {
                    text: String::new(),
                    style,
                });
                if cell.style == Style::Default {
                    cell.style = style;
                }
            }
        }
        if first != last {
            self.merges.push((first.0, first.1, last.0, last.1));
        }
    }

    pub fn set_column_width(&mut self, first: u16, last: u16, width: f64) {
        for col in first..=last {
            self.widths.insert(col, width);
        }
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Merged ranges as `A1:B2` references.
    pub fn merged_ranges(&self) -> Vec<String> {
        self.merges
            .iter()
            .map(|(r1, c1, r2, c2)| format!("{}:{}", cell_ref(*r1, *c1), cell_ref(*r2, *c2)))
            .collect()
    }

    /// Link target of a cell, external or internal.
    pub fn link(&self, row: u32, col: u16) -> Option<&str> {
        self.links
            .iter()
            .find(|(r, c, _, _)| *r == row && *c == col)
            .map(|(_, _, target, _)| match target {
                LinkTarget::External(t) | LinkTarget::Internal(t) => t.as_str(),
            })
    }

    fn external_links(&self) -> impl Iterator<Item = &str> {
        self.links.iter().filter_map(|(_, _, target, _)| match target {
            LinkTarget::External(t) => Some(t.as_str()),
            LinkTarget::Internal(_) => None,
        })
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        let _ = write!(xml, r#"<worksheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}">"#);

        if !self.widths.is_empty() {
            xml.push_str("<cols>");
            for (col, width) in &self.widths {
                let n = col + 1;
                let _ = write!(
                    xml,
                    r#"<col min="{n}" max="{n}" width="{width}" customWidth="1"/>"#
                );
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        let mut current_row = None;
        for ((row, col), cell) in &self.cells {
            if current_row != Some(*row) {
                if current_row.is_some() {
                    xml.push_str("</row>");
                }
                let _ = write!(xml, r#"<row r="{}">"#, row + 1);
                current_row = Some(*row);
            }
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                cell_ref(*row, *col),
                cell.style.index(),
                esc(&cell.text)
            );
        }
        if current_row.is_some() {
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");

        if !self.merges.is_empty() {
            let _ = write!(xml, r#"<mergeCells count="{}">"#, self.merges.len());
            for range in self.merged_ranges() {
                let _ = write!(xml, r#"<mergeCell ref="{range}"/>"#);
            }
            xml.push_str("</mergeCells>");
        }

        if !self.links.is_empty() {
            xml.push_str("<hyperlinks>");
            let mut rel = 0;
            for (row, col, target, text) in &self.links {
                let at = cell_ref(*row, *col);
                match target {
                    LinkTarget::External(_) => {
                        rel += 1;
                        let _ = write!(
                            xml,
                            r#"<hyperlink ref="{at}" r:id="rIdLink{rel}" display="{}"/>"#,
                            esc(text)
                        );
                    }
                    LinkTarget::Internal(location) => {
                        let _ = write!(
                            xml,
                            r#"<hyperlink ref="{at}" location="{}" display="{}"/>"#,
                            esc(location),
                            esc(text)
                        );
                    }
                }
            }
            xml.push_str("</hyperlinks>");
        }

        xml.push_str("</worksheet>");
        xml
    }

    fn rels_xml(&self) -> Option<String> {
        let mut links = self.external_links().peekable();
        links.peek()?;
        let mut xml = String::from(XML_DECL);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, target) in links.enumerate() {
            let _ = write!(
                xml,
                r#"<Relationship Id="rIdLink{}" Type="{REL_HYPERLINK}" Target="{}" TargetMode="External"/>"#,
                i + 1,
                esc(target)
            );
        }
        xml.push_str("</Relationships>");
        Some(xml)
    }
}

/// An in-memory `.xlsx` workbook.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet. The name is made valid and unique first.
    pub fn add_sheet(&mut self, name: &str) -> &mut Worksheet {
        let taken: BTreeSet<String> = self.sheets.iter().map(|s| s.name.to_lowercase()).collect();
        let base = sheet_name(name);
        let mut unique = base.clone();
        let mut n = 1;
        while taken.contains(&unique.to_lowercase()) {
            n += 1;
            let suffix = format!(" ({n})");
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
            unique = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        }
        self.sheets.push(Worksheet::new(unique));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn package(&self) -> Package {
        let mut package = Package::new();
        package.add("[Content_Types].xml", self.content_types());
        package.add("_rels/.rels", root_rels("xl/workbook.xml"));
        package.add("xl/workbook.xml", self.workbook_xml());
        package.add("xl/_rels/workbook.xml.rels", self.workbook_rels());
        package.add("xl/styles.xml", STYLES);
        for (i, sheet) in self.sheets.iter().enumerate() {
            package.add(format!("xl/worksheets/sheet{}.xml", i + 1), sheet.to_xml());
            if let Some(rels) = sheet.rels_xml() {
                package.add(format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1), rels);
            }
        }
        package
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package().to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.package().save(path)
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
        xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
        for i in 1..=self.sheets.len() {
            let _ = write!(
                xml,
                r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            );
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(XML_DECL);
        let _ = write!(xml, r#"<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheets>"#);
        for (i, sheet) in self.sheets.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                esc(&sheet.name),
                i + 1,
                i + 1
            );
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(XML_DECL);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for i in 1..=self.sheets.len() {
            let _ = write!(
                xml,
                r#"<Relationship Id="rId{i}" Type="{NS_REL}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            );
        }
        let _ = write!(
            xml,
            r#"<Relationship Id="rIdStyles" Type="{NS_REL}/styles" Target="styles.xml"/>"#
        );
        xml.push_str("</Relationships>");
        xml
    }
}

pub(crate) fn root_rels(main: &str) -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{NS_REL}/officeDocument" Target="{main}"/></Relationships>"#
    )
}

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="4">"#,
    r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="18"/><name val="Calibri"/></font>"#,
    r#"<font><u/><sz val="11"/><color rgb="FF0563C1"/><name val="Calibri"/></font>"#,
    r#"</fonts>"#,
    r#"<fills count="4">"#,
    r#"<fill><patternFill patternType="none"/></fill>"#,
    r#"<fill><patternFill patternType="gray125"/></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FF0DA917"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"<fill><patternFill patternType="solid"><fgColor rgb="FFFF0000"/><bgColor indexed="64"/></patternFill></fill>"#,
    r#"</fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="6">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#,
    r#"<xf numFmtId="0" fontId="2" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="3" borderId="0" xfId="0" applyFill="1"/>"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment vertical="top" wrapText="1"/></xf>"#,
    r#"<xf numFmtId="0" fontId="3" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"</cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#,
);

/// Column letters for a zero-based index: 0 is `A`, 26 is `AA`.
pub fn column_name(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// `A1` reference of a zero-based `(row, col)`.
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// A valid sheet name: forbidden characters replaced, at most 31 characters,
/// never empty.
pub fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.trim().is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}
