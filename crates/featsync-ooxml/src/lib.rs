//! Minimal Office Open XML writers.
//!
//! [`Workbook`] produces `.xlsx` spreadsheets (inline strings, merged
//! ranges, hyperlinks, a handful of fixed styles) and [`Document`] produces
//! `.docx` files (headings, paragraphs, bullets, tables, PNG pictures, page
//! breaks). Both are assembled in memory and written as one zip package.

mod docx;
mod package;
mod png;
mod xlsx;

pub use docx::{Document, Run};
pub use package::{Package, read_part};
pub use png::png_dimensions;
pub use xlsx::{Cell, Style, Workbook, Worksheet, cell_ref, column_name, sheet_name};

use std::borrow::Cow;

/// Text escaped for XML content and attribute values.
pub(crate) fn esc(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}
