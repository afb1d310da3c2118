//! Workbooks for a release, a test plan or a list of test executions.
//!
//! A plan workbook opens on a `Summary` sheet listing its executions, each
//! linked to its own sheet. An execution sheet has one block per test run:
//!
//! ```text
//!      A                B      C         D        E           F       G            H
//! 2    Test execution:  <execution summary, B:F merged>
//! 3    To summary
//! 4                     US ID  US title  Test ID  Test title  Status  Description  Evidence
//! 5..                   one block per test, max(description, evidences, defects) rows
//! ```

use anyhow::{Context, Result};
use featsync_config::FieldIds;
use featsync_error::FeatsyncError;
use featsync_ids::{IssueKey, parse_key_list};
use featsync_ooxml::{Style, Workbook, Worksheet};
use featsync_output_layout::{ReportPaths, evidence_link, execution_dir, prepare_folder};
use featsync_ports::{ExecutionRef, ExecutionSource, TestRun};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const SUMMARY_SHEET: &str = "Summary";

const HEADER_ROW: u32 = 3;
const FIRST_ROW: u32 = 4;
const HEADERS: [&str; 7] = [
    "US ID",
    "US title",
    "Test ID",
    "Test title",
    "Status",
    "Description",
    "Evidence",
];

const COL_STORY: u16 = 1;
const COL_STORY_TITLE: u16 = 2;
const COL_TEST: u16 = 3;
const COL_TITLE: u16 = 4;
const COL_STATUS: u16 = 5;
const COL_DESCRIPTION: u16 = 6;
const COL_EVIDENCE: u16 = 7;

/// What a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    /// Every test plan whose fix version is the release.
    Release(String),
    Plan(IssueKey),
    /// One workbook per execution.
    Executions(Vec<IssueKey>),
}

impl ReportTarget {
    /// Target for a comma-separated list such as `"EXEC-1, EXEC-2"`.
    pub fn executions(list: &str) -> Result<Self> {
        let keys =
            parse_key_list(list).map_err(|e| FeatsyncError::malformed_input(e.to_string()))?;
        if keys.is_empty() {
            return Err(FeatsyncError::malformed_input("no test execution given").into());
        }
        Ok(Self::Executions(keys))
    }
}

/// One test run as written in an execution sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestLine {
    /// Story key and title, from the first issue link of the test.
    pub story: Option<(IssueKey, String)>,
    pub key: IssueKey,
    pub title: String,
    pub status: String,
    pub description: Vec<String>,
    /// File name and link relative to the report root.
    pub evidences: Vec<(String, String)>,
    pub defects: usize,
}

impl TestLine {
    /// Rows taken by the block of this test.
    pub fn height(&self) -> u32 {
        let rows = self
            .description
            .len()
            .max(self.evidences.len())
            .max(self.defects)
            .max(1);
        u32::try_from(rows).unwrap_or(u32::MAX)
    }

    pub fn is_failed(&self) -> bool {
        self.status.contains("FAIL")
    }
}

/// Builds execution workbooks from a test-management source.
pub struct ReleaseReporter<'a, S: ExecutionSource + ?Sized> {
    source: &'a S,
    scenario_field: String,
    steps_field: String,
}

impl<'a, S: ExecutionSource + ?Sized> ReleaseReporter<'a, S> {
    pub fn new(source: &'a S, fields: &FieldIds) -> Self {
        Self {
            source,
            scenario_field: fields.scenario.clone(),
            steps_field: fields.manual_steps.clone(),
        }
    }

    /// Write every workbook of `target` into a fresh `dest` folder.
    ///
    /// Whatever `dest` held before is removed. Returns the workbook paths.
    pub fn generate(&self, target: &ReportTarget, dest: &Path) -> Result<Vec<PathBuf>> {
        let paths = ReportPaths::new(prepare_folder(dest)?);
        tracing::info!(dest = %paths.root.display(), "writing reports");
        match target {
            ReportTarget::Release(release) => {
                let plans = self.source.test_plans_in_release(release)?;
                if plans.is_empty() {
                    tracing::warn!(release = %release, "no test plan in release");
                }
                plans
                    .iter()
                    .map(|plan| self.plan_workbook(&paths, plan))
                    .collect()
            }
            ReportTarget::Plan(plan) => Ok(vec![self.plan_workbook(&paths, plan)?]),
            ReportTarget::Executions(executions) => executions
                .iter()
                .map(|execution| self.execution_workbook(&paths, execution))
                .collect(),
        }
    }

    /// `<plan>-report.xlsx`: the summary sheet and one sheet per execution.
    pub fn plan_workbook(&self, paths: &ReportPaths, plan: &IssueKey) -> Result<PathBuf> {
        let plan_summary = self.summary_of(plan)?;
        let executions = self.source.executions_of_plan(plan)?;
        tracing::info!(%plan, executions = executions.len(), "test plan report");

        let mut workbook = Workbook::new();
        write_summary_header(workbook.add_sheet(SUMMARY_SHEET), plan, &plan_summary);

        let mut listed = Vec::with_capacity(executions.len());
        for execution in &executions {
            let summary = self.execution_summary(execution)?;
            let dir = execution_dir(Some(plan), &execution.key);
            let sheet = workbook.add_sheet(execution.key.as_str());
            let sheet_name = sheet.name().to_string();
            self.write_execution(sheet, paths, &dir, &execution.key, &summary, true)?;
            listed.push((sheet_name, &execution.key, summary));
        }

        if let Some(sheet) = workbook.sheet_mut(SUMMARY_SHEET) {
            for (row, (sheet_name, key, summary)) in (FIRST_ROW..).zip(&listed) {
                sheet.write_internal_link(row, 1, &format!("'{sheet_name}'!A1"), key.as_str());
                sheet.merge((row, 3), (row, 5), Some(summary.as_str()), Style::Wrap);
            }
        }

        let path = paths.workbook(plan);
        workbook.save(&path)?;
        tracing::info!(path = %path.display(), "workbook written");
        Ok(path)
    }

    /// `<execution>-report.xlsx` with the execution sheet only.
    pub fn execution_workbook(&self, paths: &ReportPaths, execution: &IssueKey) -> Result<PathBuf> {
        let summary = self.summary_of(execution)?;
        let dir = execution_dir(None, execution);

        let mut workbook = Workbook::new();
        let sheet = workbook.add_sheet(execution.as_str());
        self.write_execution(sheet, paths, &dir, execution, &summary, false)?;

        let path = paths.workbook(execution);
        workbook.save(&path)?;
        tracing::info!(path = %path.display(), "workbook written");
        Ok(path)
    }

    /// Fill an execution sheet, downloading evidences under `dir`.
    pub fn write_execution(
        &self,
        sheet: &mut Worksheet,
        paths: &ReportPaths,
        dir: &str,
        execution: &IssueKey,
        summary: &str,
        link_to_summary: bool,
    ) -> Result<()> {
        format_execution_sheet(sheet, link_to_summary);
        sheet.write(1, 0, "Test execution:", Style::Default);
        sheet.merge((1, 1), (1, 5), Some(summary), Style::Default);

        let runs = self.source.tests_in_execution(execution)?;
        tracing::debug!(%execution, tests = runs.len(), "execution runs");
        let mut row = FIRST_ROW;
        for run in &runs {
            let line = self.test_line(paths, dir, run)?;
            self.write_test_line(sheet, row, &line);
            row += line.height();
        }
        Ok(())
    }

    /// Gather what the sheet shows for one run and download its evidences.
    pub fn test_line(&self, paths: &ReportPaths, dir: &str, run: &TestRun) -> Result<TestLine> {
        let fields = self.source.issue_fields(
            &run.key,
            &["summary", self.scenario_field.as_str(), self.steps_field.as_str(), "issuelinks"],
        )?;

        let story = linked_story(&fields);
        if story.is_none() {
            tracing::warn!(test = %run.key, "no story attached to test");
        }

        let folder = paths.evidence_dir(dir, &run.key);
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("create {}", folder.display()))?;
        let mut evidences = Vec::with_capacity(run.evidences.len());
        for evidence in &run.evidences {
            let Some(file_name) = Path::new(&evidence.file_name)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
            else {
                tracing::warn!(
                    test = %run.key,
                    file = %evidence.file_name,
                    "unusable evidence name"
                );
                continue;
            };
            self.source
                .download(&evidence.file_url, &folder.join(&file_name))
                .with_context(|| format!("download evidence {file_name} of {}", run.key))?;
            let link = evidence_link(dir, &run.key, &file_name);
            evidences.push((file_name, link));
        }

        Ok(TestLine {
            story,
            key: run.key.clone(),
            title: text_field(&fields, "summary"),
            status: run.status.clone(),
            description: description_lines(&fields, &self.scenario_field, &self.steps_field),
            evidences,
            defects: run.defects.len(),
        })
    }

    fn write_test_line(&self, sheet: &mut Worksheet, row: u32, line: &TestLine) {
        for (r, text) in (row..).zip(&line.description) {
            sheet.write(r, COL_DESCRIPTION, text.as_str(), Style::Wrap);
        }
        for (r, (name, link)) in (row..).zip(&line.evidences) {
            sheet.write_url(r, COL_EVIDENCE, link, name);
        }

        if let Some((key, title)) = &line.story {
            sheet.write_url(row, COL_STORY, &self.source.browse_url(key), key.as_str());
            sheet.write(row, COL_STORY_TITLE, title.as_str(), Style::Wrap);
        }
        sheet.write_url(row, COL_TEST, &self.source.browse_url(&line.key), line.key.as_str());
        sheet.write(row, COL_TITLE, line.title.as_str(), Style::Wrap);
        let status_style = if line.is_failed() {
            Style::Fail
        } else {
            Style::Default
        };
        sheet.write(row, COL_STATUS, line.status.as_str(), status_style);

        let last = row + line.height() - 1;
        if last > row {
            for col in COL_STORY..=COL_STATUS {
                sheet.merge((row, col), (last, col), None, Style::Wrap);
            }
            if line.description.len() <= 1 {
                sheet.merge((row, COL_DESCRIPTION), (last, COL_DESCRIPTION), None, Style::Wrap);
            }
        }
    }

    fn summary_of(&self, key: &IssueKey) -> Result<String> {
        let fields = self.source.issue_fields(key, &["summary"])?;
        Ok(text_field(&fields, "summary"))
    }

    fn execution_summary(&self, execution: &ExecutionRef) -> Result<String> {
        if execution.summary.is_empty() {
            self.summary_of(&execution.key)
        } else {
            Ok(execution.summary.clone())
        }
    }
}

fn format_execution_sheet(sheet: &mut Worksheet, link_to_summary: bool) {
    sheet.set_column_width(0, 0, 10.0);
    sheet.set_column_width(COL_STORY_TITLE, COL_STORY_TITLE, 30.0);
    sheet.set_column_width(COL_TITLE, COL_TITLE, 35.0);
    sheet.set_column_width(COL_DESCRIPTION, COL_DESCRIPTION, 90.0);
    sheet.set_column_width(COL_EVIDENCE, COL_EVIDENCE, 45.0);
    if link_to_summary {
        sheet.write_internal_link(2, 0, &format!("'{SUMMARY_SHEET}'!A1"), "To summary");
    }
    for (col, header) in (COL_STORY..).zip(HEADERS) {
        sheet.write(HEADER_ROW, col, header, Style::Header);
    }
}

fn write_summary_header(sheet: &mut Worksheet, plan: &IssueKey, summary: &str) {
    sheet.write(
        0,
        0,
        format!("This page is a summary of the test execution(s) for test plan {plan}"),
        Style::Default,
    );
    sheet.merge((1, 1), (1, 5), Some(summary), Style::Title);
    sheet.write(HEADER_ROW, 1, "Key", Style::Header);
    sheet.merge((HEADER_ROW, 3), (HEADER_ROW, 5), Some("Description"), Style::Header);
    sheet.set_column_width(3, 5, 15.0);
}

fn text_field(fields: &Value, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Story of the first issue link, inward side first.
fn linked_story(fields: &Value) -> Option<(IssueKey, String)> {
    let link = fields.pointer("/issuelinks/0")?;
    ["inwardIssue", "outwardIssue"].iter().find_map(|side| {
        let issue = link.get(side)?;
        let key = issue.get("key")?.as_str()?;
        let title = issue
            .pointer("/fields/summary")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some((IssueKey::new(key), title.to_string()))
    })
}

/// The Cucumber scenario as one line, or the manual steps one per line.
fn description_lines(fields: &Value, scenario_field: &str, steps_field: &str) -> Vec<String> {
    if let Some(scenario) = fields.get(scenario_field).and_then(Value::as_str) {
        return vec![scenario.to_string()];
    }
    fields
        .get(steps_field)
        .and_then(|manual| manual.get("steps"))
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .filter_map(|s| s.get("step").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
