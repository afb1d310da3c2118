//! Evidence document of one executed scenario.
//!
//! The document holds, in order and each only when available: the feature
//! and scenario text, the HTTP exchanges recorded during the run, the
//! screenshots of the run and the failure message written next to them.

use crate::feature_doc::{add_description, add_steps, titled};
use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use featsync_gherkin::{Feature, Scenario, description_lines};
use featsync_ooxml::{Document, Run};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Width of every screenshot in the document.
pub const PICTURE_WIDTH_CM: f64 = 18.0;

pub const FAILURE_HEADING: &str = "Failure cause message";

/// One request sent during a scenario and the answer it got.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpExchange {
    pub url: String,
    pub method: String,
    pub path_url: String,
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub response: String,
}

/// Read a JSON array of exchanges.
pub fn load_history(path: &Path) -> Result<Vec<HttpExchange>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read HTTP history {}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| {
        FeatsyncError::malformed_input(format!("HTTP history is not valid: {e}"))
            .with_context("file", path.display().to_string())
            .with_context("line", e.line().to_string())
            .with_context("column", e.column().to_string())
            .into()
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvidenceInputs<'a> {
    pub scenario: Option<(&'a Feature, &'a Scenario)>,
    pub history: &'a [HttpExchange],
    /// Folder holding the `*.png` screenshots and `*.txt` failure messages.
    pub png_dir: Option<&'a Path>,
}

pub fn scenario_evidence(inputs: &EvidenceInputs<'_>) -> Result<Document> {
    let mut doc = Document::new();
    if let Some((feature, scenario)) = inputs.scenario {
        add_scenario(&mut doc, feature, scenario);
    }
    add_history(&mut doc, inputs.history);
    if let Some(dir) = inputs.png_dir {
        add_screenshots(&mut doc, dir)?;
    }
    Ok(doc)
}

fn add_scenario(doc: &mut Document, feature: &Feature, scenario: &Scenario) {
    doc.add_heading(&format!("Feature: {}", feature.name), 1);
    doc.add_paragraph(&format!("Tags: {}", feature.tags.join(", ")));
    add_description(doc, &description_lines(feature.description.as_deref()));
    doc.add_paragraph("");
    doc.add_heading(&titled(&scenario.keyword, &scenario.name), 2);
    add_steps(doc, &scenario.steps);
    doc.add_paragraph("");
}

fn add_history(doc: &mut Document, history: &[HttpExchange]) {
    for (i, exchange) in history.iter().enumerate() {
        if i > 0 {
            doc.add_page_break();
        }
        doc.add_heading(&format!("Endpoint: {}", exchange.url), 3);
        let headers = exchange
            .headers
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let fields = [
            ("Method:", exchange.method.clone()),
            ("Path_url:", exchange.path_url.clone()),
            ("Status_code:", exchange.status_code.to_string()),
            ("Headers:", format!("{{{headers}}}")),
            ("Body:", exchange.body.clone().unwrap_or_default()),
            ("Response:", exchange.response.clone()),
        ];
        for (title, value) in fields {
            doc.add_runs(&[Run::bold(title), Run::plain(format!(" {value}"))]);
        }
    }
}

fn add_screenshots(doc: &mut Document, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "screenshot folder not found");
        return Ok(());
    }

    let mut pictures = files_with_extension(dir, "png")?;
    pictures.sort_by_key(|(path, modified)| (*modified, path.clone()));
    tracing::debug!(dir = %dir.display(), pictures = pictures.len(), "adding screenshots");
    for (path, _) in &pictures {
        doc.add_picture(path, PICTURE_WIDTH_CM)?;
        doc.add_paragraph("");
    }

    let mut messages = files_with_extension(dir, "txt")?;
    messages.sort_by(|a, b| a.0.cmp(&b.0));
    if let Some((path, _)) = messages.first() {
        let message = std::fs::read_to_string(path)
            .with_context(|| format!("read failure message {}", path.display()))?;
        doc.add_heading(FAILURE_HEADING, 1);
        doc.add_paragraph(message.trim_end());
    }
    Ok(())
}

/// Files directly inside `dir` with the given extension and their mtime.
fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<(PathBuf, SystemTime)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches || !path.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, modified));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(url: &str) -> HttpExchange {
        HttpExchange {
            url: url.to_string(),
            method: "POST".to_string(),
            path_url: "/api/login".to_string(),
            status_code: 401,
            headers: [("Accept".to_string(), "application/json".to_string())].into(),
            body: Some("{\"user\":\"alice\"}".to_string()),
            response: "denied".to_string(),
        }
    }

    #[test]
    fn history_lists_each_request() {
        let history = vec![exchange("https://h/api/login"), exchange("https://h/api/logout")];
        let doc = scenario_evidence(&EvidenceInputs {
            history: &history,
            ..EvidenceInputs::default()
        })
        .unwrap();
        let text = doc.text();
        assert_eq!(text[0], "Endpoint: https://h/api/login");
        assert_eq!(text[1], "Method: POST");
        assert_eq!(text[2], "Path_url: /api/login");
        assert_eq!(text[3], "Status_code: 401");
        assert_eq!(text[4], "Headers: {Accept: application/json}");
        assert_eq!(text[5], "Body: {\"user\":\"alice\"}");
        assert_eq!(text[6], "Response: denied");
        assert_eq!(text[7], "Endpoint: https://h/api/logout");

        let xml = featsync_ooxml::read_part(&doc.to_bytes().unwrap(), "word/document.xml").unwrap();
        assert_eq!(xml.matches(r#"<w:br w:type="page"/>"#).count(), 1);
    }

    #[test]
    fn history_files_parse_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r#"[{"url": "https://h/x", "method": "GET", "status_code": 200}]"#)
            .unwrap();
        let history = load_history(&path).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].body, None);
        assert!(history[0].headers.is_empty());

        std::fs::write(&path, "[{").unwrap();
        let err = load_history(&path).unwrap_err();
        assert_eq!(
            featsync_error::kind_of(&err),
            Some(featsync_error::ErrorKind::MalformedInput)
        );
    }

    #[test]
    fn missing_screenshot_folder_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let doc = scenario_evidence(&EvidenceInputs {
            png_dir: Some(&missing),
            ..EvidenceInputs::default()
        })
        .unwrap();
        assert!(doc.text().is_empty());
    }
}
