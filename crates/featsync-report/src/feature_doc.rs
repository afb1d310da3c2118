//! Feature documentation as a Word document.

use crate::log::{add_execution_log, parse_plain_log};
use anyhow::{Context, Result};
use featsync_error::{ErrorKind, kind_of};
use featsync_gherkin::{
    Feature, Scenario, Step, Table, description_lines, feature_files, read_feature, step_keywords,
};
use featsync_ooxml::{Document, Run};
use itertools::Itertools;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static BUSINESS_RULES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[Bb]usiness [Rr]ules").expect("business rules pattern is valid")
});

/// Document of every feature file under `repository`, sorted by path.
///
/// `user_story_tag` selects the tags listed as related stories. With an
/// `execution_log`, the parsed behave plain log is appended. Files that do
/// not parse are skipped with a warning.
pub fn feature_document(
    repository: &Path,
    title: &str,
    user_story_tag: Option<&str>,
    execution_log: Option<&Path>,
) -> Result<Document> {
    let files = feature_files(repository)?;
    tracing::info!(repository = %repository.display(), files = files.len(), "documenting features");

    let mut doc = Document::new();
    doc.add_heading(title, 0);
    doc.add_page_break();

    for path in &files {
        let feature = match read_feature(path) {
            Ok(feature) => feature,
            Err(e) if kind_of(&e) == Some(ErrorKind::MalformedInput) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping feature file");
                continue;
            }
            Err(e) => return Err(e),
        };
        add_feature(&mut doc, &feature, user_story_tag);
        doc.add_page_break();
    }

    if let Some(log_path) = execution_log {
        let text = std::fs::read_to_string(log_path)
            .with_context(|| format!("read execution log {}", log_path.display()))?;
        add_execution_log(&mut doc, &parse_plain_log(&text));
    }
    Ok(doc)
}

/// Build the feature document and save it at `output`.
pub fn write_feature_document(
    repository: &Path,
    title: &str,
    user_story_tag: Option<&str>,
    execution_log: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let doc = feature_document(repository, title, user_story_tag, execution_log)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    doc.save(output)?;
    tracing::info!(path = %output.display(), "feature document written");
    Ok(())
}

/// Section of one feature: heading, related stories, description,
/// background and scenarios.
pub fn add_feature(doc: &mut Document, feature: &Feature, user_story_tag: Option<&str>) {
    doc.add_heading(&feature.name, 1);
    if let Some(tag) = user_story_tag {
        let stories = feature
            .tags
            .iter()
            .filter(|t| t.contains(tag))
            .map(|t| format!("'{t}'"))
            .join(", ");
        if !stories.is_empty() {
            doc.add_paragraph(&format!("Related to the user story: {stories}"));
        }
    }
    add_description(doc, &description_lines(feature.description.as_deref()));

    if let Some(background) = &feature.background {
        let name = background.name.as_str();
        doc.add_heading(&titled(&background.keyword, name), 2);
        add_steps(doc, &background.steps);
    }

    for scenario in &feature.scenarios {
        add_scenario(doc, scenario);
    }
    for rule in &feature.rules {
        doc.add_heading(&titled(&rule.keyword, &rule.name), 2);
        add_description(doc, &description_lines(rule.description.as_deref()));
        for scenario in &rule.scenarios {
            add_scenario(doc, scenario);
        }
    }
}

fn add_scenario(doc: &mut Document, scenario: &Scenario) {
    doc.add_heading(&titled(&scenario.keyword, &scenario.name), 2);
    add_steps(doc, &scenario.steps);
    for examples in &scenario.examples {
        let name = examples.name.as_deref().unwrap_or_default();
        doc.add_heading(&titled(&examples.keyword, name), 3);
        if let Some(table) = &examples.table {
            add_table(doc, table);
        }
    }
}

/// First row as headings, the rest as body.
fn add_table(doc: &mut Document, table: &Table) {
    if let Some((headings, rows)) = table.rows.split_first() {
        doc.add_table(headings, rows);
    }
}

/// `*` lines become bullets, business rules lines are bold.
pub(crate) fn add_description(doc: &mut Document, lines: &[String]) {
    for line in lines.iter().map(|l| l.trim()) {
        if let Some(point) = line.strip_prefix('*') {
            doc.add_bullet(point.trim_start());
        } else if BUSINESS_RULES.is_match(line) {
            doc.add_runs(&[Run::bold(line)]);
        } else {
            doc.add_paragraph(line);
        }
    }
}

/// One compact paragraph per step with its keyword in bold.
pub(crate) fn add_steps(doc: &mut Document, steps: &[Step]) {
    for (keyword, step) in step_keywords(steps).into_iter().zip(steps) {
        doc.add_compact(&[Run::bold(keyword), Run::plain(format!(" {}", step.value))]);
        if let Some(table) = &step.table {
            add_table(doc, table);
        }
        if let Some(doc_string) = &step.docstring {
            doc.add_compact(&[Run::plain(doc_string.as_str())]);
        }
    }
}

pub(crate) fn titled(keyword: &str, name: &str) -> String {
    if name.is_empty() {
        format!("{keyword}:")
    } else {
        format!("{keyword}: {name}")
    }
}
