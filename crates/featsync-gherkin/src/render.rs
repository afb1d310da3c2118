//! Plain-text rendering of steps, tables and descriptions.

use crate::model::description_lines;
use gherkin::{Examples, Feature, Step, Table};
use regex::Regex;
use std::sync::LazyLock;

static BUSINESS_RULES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Bb]usiness [Rr]ules").expect("business rules pattern is valid"));

/// Keyword to show for each step: a keyword already used earlier in the
/// same block is shown as `And`.
pub fn step_keywords(steps: &[Step]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    steps
        .iter()
        .map(|step| {
            let keyword = step.keyword.trim();
            if seen.contains(&keyword) {
                "And"
            } else {
                seen.push(keyword);
                keyword
            }
        })
        .collect()
}

/// One `<Keyword> <text>` line per step.
pub fn render_steps(steps: &[Step]) -> String {
    step_keywords(steps)
        .into_iter()
        .zip(steps)
        .map(|(keyword, step)| format!("{keyword} {}", step.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Width of each column: the longest cell in it, in characters.
pub fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// Fixed-width rendering, one ` | a | bb |` line per row, each ending in `\n`.
pub fn render_rows(rows: &[Vec<String>]) -> String {
    let widths = column_widths(rows);
    let mut out = String::new();
    for row in rows {
        for (col, width) in widths.iter().enumerate() {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(cell.chars().count());
            out.push_str(" | ");
            out.push_str(cell);
            out.push_str(&" ".repeat(pad));
        }
        out.push_str(" |\n");
    }
    out
}

pub fn render_table(table: &Table) -> String {
    render_rows(&table.rows)
}

/// `Examples: name` followed by its table, for every examples block.
pub fn render_examples(examples: &[Examples]) -> String {
    examples
        .iter()
        .map(|e| {
            let table = e.table.as_ref().map(render_table).unwrap_or_default();
            let name = e.name.as_deref().unwrap_or_default();
            format!("{}: {name}\n{table}", e.keyword)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"{keyword}: {name}\n\n"` then the description lines, with a blank line
/// opened before every "business rules" mention.
pub fn render_description(feature: &Feature) -> String {
    let text = format!(
        "{}: {}\n\n{}",
        feature.keyword,
        feature.name,
        description_lines(feature.description.as_deref()).join("\n")
    );
    BUSINESS_RULES
        .replace_all(&text, "\nBusiness rules")
        .into_owned()
}
