//! Xray (raven 1.0) test-management client.
//!
//! Built on top of [`JiraClient`]: same base URL, same credentials. Covers
//! test plans, test executions and their evidences, and the Cucumber result
//! import used to publish a run against a test plan.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeZone};
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use featsync_jira::JiraClient;
use featsync_ports::{ExecutionRef, ExecutionSource, HttpResponse, TestRun};
use reqwest::blocking::multipart::{Form, Part};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// Content type Xray is told evidence uploads carry.
pub const EVIDENCE_CONTENT_TYPE: &str = "application/msword";

#[derive(Debug)]
pub struct XrayClient {
    jira: JiraClient,
}

/// Result of publishing a Cucumber report against a test plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub execution: IssueKey,
    pub update: HttpResponse,
}

impl XrayClient {
    pub fn new(jira: JiraClient) -> Self {
        Self { jira }
    }

    pub fn jira(&self) -> &JiraClient {
        &self.jira
    }

    fn raven_url(&self, path: &str) -> String {
        format!("{}/rest/raven/1.0{path}", self.jira.base_url())
    }

    /// Tests planned in `plan`. The server may paginate; only the first page
    /// is returned.
    pub fn tests_in_plan(&self, plan: &IssueKey) -> Result<Vec<Value>> {
        self.jira
            .get_json(&self.raven_url(&format!("/api/testplan/{plan}/test")), &[])
    }

    pub fn executions_of_plan(&self, plan: &IssueKey) -> Result<Vec<ExecutionRef>> {
        self.jira.get_json(
            &self.raven_url(&format!("/api/testplan/{plan}/testexecution")),
            &[],
        )
    }

    /// Runs of an execution with their status, evidences and defects.
    pub fn tests_in_execution(&self, execution: &IssueKey) -> Result<Vec<TestRun>> {
        self.jira.get_json(
            &self.raven_url(&format!("/api/testexec/{execution}/test")),
            &[("detailed", "true".to_string())],
        )
    }

    /// Evidences of every run, saved under `<folder>/<test key>/`.
    pub fn download_execution_evidences(
        &self,
        execution: &IssueKey,
        folder: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();
        for run in self.tests_in_execution(execution)? {
            let dest = ensure_dir(folder.join(run.key.as_str()))?;
            for evidence in &run.evidences {
                let file = dest.join(&evidence.file_name);
                self.jira.download_file(&evidence.file_url, &file)?;
                saved.push(file);
            }
        }
        tracing::info!(execution = %execution, files = saved.len(), "downloaded evidences");
        Ok(saved)
    }

    /// Evidences of every execution of `plan`, under `<folder>/<execution>/`.
    pub fn download_plan_evidences(&self, plan: &IssueKey, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();
        for execution in self.executions_of_plan(plan)? {
            let dest = ensure_dir(folder.join(execution.key.as_str()))?;
            saved.extend(self.download_execution_evidences(&execution.key, &dest)?);
        }
        Ok(saved)
    }

    /// Evidences of every test plan of `release`, under `<folder>/<plan>/`.
    pub fn download_release_evidences(&self, release: &str, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();
        for plan in self.jira.test_plans_in_release(release)? {
            let dest = ensure_dir(folder.join(plan.as_str()))?;
            saved.extend(self.download_plan_evidences(&plan, &dest)?);
        }
        Ok(saved)
    }

    /// Import a Cucumber JSON report, creating a new test execution.
    pub fn import_cucumber(&self, results: &Value) -> Result<HttpResponse> {
        self.jira
            .post_json(&self.raven_url("/import/execution/cucumber"), results)
    }

    /// Import with explicit execution fields (`info`) next to the results.
    pub fn import_cucumber_multipart(&self, info: &Value, results: &Value) -> Result<HttpResponse> {
        let form = Form::new()
            .part("info", json_part(info, "info.json")?)
            .part("result", json_part(results, "result.json")?);
        self.jira
            .post_multipart(&self.raven_url("/import/execution/cucumber/multipart"), form)
    }

    /// Import the report at `report`, then attach the new execution to `plan`
    /// and give it `summary`.
    pub fn import_execution_to_test_plan(
        &self,
        plan: &IssueKey,
        report: &Path,
        summary: &str,
    ) -> Result<ImportOutcome> {
        let results = read_json(report)?;
        let imported = self.import_cucumber(&results)?;
        if !imported.is_applied() {
            return Err(FeatsyncError::remote_lookup(format!(
                "cucumber import returned {}",
                imported.status
            ))
            .with_context("body", imported.body)
            .into());
        }
        let execution = imported
            .json()?
            .pointer("/testExecIssue/key")
            .and_then(Value::as_str)
            .map(IssueKey::new)
            .ok_or_else(|| FeatsyncError::malformed_input("import response names no execution"))?;
        tracing::info!(execution = %execution, plan = %plan, "imported execution");

        let mut fields = serde_json::Map::new();
        fields.insert(self.jira.fields().test_plan.clone(), json!([plan]));
        fields.insert("summary".into(), json!(summary));
        let update = self
            .jira
            .update_issue(&execution, &json!({"update": {}, "fields": fields}))?;
        if !update.is_applied() {
            tracing::warn!(status = update.status, body = %update.body, "execution update failed");
        }
        Ok(ImportOutcome { execution, update })
    }

    /// Id of the run of `test` inside `execution`.
    pub fn test_run_id(&self, execution: &IssueKey, test: &IssueKey) -> Result<u64> {
        let run: Value = self.jira.get_json(
            &self.raven_url("/api/testrun"),
            &[
                ("testExecIssueKey", execution.to_string()),
                ("testIssueKey", test.to_string()),
            ],
        )?;
        run.get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                FeatsyncError::not_found(format!("no run of {test} in {execution}")).into()
            })
    }

    /// Upload `file` as evidence of a test run.
    pub fn attach_to_test_run(&self, run_id: u64, file: &Path) -> Result<HttpResponse> {
        let data = fs::read(file).with_context(|| format!("read evidence {}", file.display()))?;
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let payload = json!({
            "data": STANDARD.encode(data),
            "filename": filename,
            "contentType": EVIDENCE_CONTENT_TYPE,
        });
        self.jira
            .post_json(&self.raven_url(&format!("/api/testrun/{run_id}/attachment")), &payload)
    }

    /// Attach evidence files to the runs of `execution`, keyed by test.
    ///
    /// A test whose run can't be found is skipped with a warning.
    pub fn load_attachments(
        &self,
        execution: &IssueKey,
        evidences: &BTreeMap<IssueKey, Vec<PathBuf>>,
    ) -> Result<Vec<HttpResponse>> {
        let mut responses = Vec::new();
        for (test, files) in evidences {
            let run_id = match self.test_run_id(execution, test) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(test = %test, error = %e, "no test run, evidences skipped");
                    continue;
                }
            };
            for file in files {
                let resp = self.attach_to_test_run(run_id, file)?;
                tracing::debug!(
                    test = %test,
                    file = %file.display(),
                    status = resp.status,
                    "evidence uploaded"
                );
                responses.push(resp);
            }
        }
        Ok(responses)
    }
}

impl ExecutionSource for XrayClient {
    fn browse_url(&self, key: &IssueKey) -> String {
        self.jira.browse_url(key)
    }

    fn test_plans_in_release(&self, release: &str) -> Result<Vec<IssueKey>> {
        self.jira.test_plans_in_release(release)
    }

    fn issue_fields(&self, key: &IssueKey, fields: &[&str]) -> Result<Value> {
        self.jira.issue_fields(key, fields)
    }

    fn executions_of_plan(&self, plan: &IssueKey) -> Result<Vec<ExecutionRef>> {
        XrayClient::executions_of_plan(self, plan)
    }

    fn tests_in_execution(&self, execution: &IssueKey) -> Result<Vec<TestRun>> {
        XrayClient::tests_in_execution(self, execution)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.jira.download_file(url, dest)
    }
}

/// Summary given to an imported execution:
/// `"18-October-2026 execution. Ended at 14:05. System information: <system>"`.
pub fn execution_summary<Tz>(ended: &DateTime<Tz>, system: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{} execution. Ended at {}. System information: {system}",
        ended.format("%d-%B-%Y"),
        ended.format("%H:%M")
    )
}

/// Evidence map file: `{"PFWES-2": ["shots/a.png", ...], ...}`.
pub fn read_evidence_map(path: &Path) -> Result<BTreeMap<IssueKey, Vec<PathBuf>>> {
    let value = read_json(path)?;
    serde_json::from_value(value)
        .map_err(|e| FeatsyncError::malformed_input(format!("evidence map: {e}")).into())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| {
        FeatsyncError::malformed_input(format!("{} is not valid JSON: {e}", path.display()))
            .with_context("line", e.line().to_string())
            .with_context("column", e.column().to_string())
            .into()
    })
}

fn json_part(value: &Value, file_name: &'static str) -> Result<Part> {
    Part::text(value.to_string())
        .file_name(file_name)
        .mime_str("application/json")
        .context("build multipart part")
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
