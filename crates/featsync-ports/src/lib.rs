//! Port traits between the featsync engines and an issue tracker.
//!
//! The reconciliation engine only needs [`IssueTracker`]; the report
//! generators only need [`ExecutionSource`]. Both are implemented over HTTP
//! in `featsync-jira` / `featsync-xray` and in memory in `featsync-testkit`.

use anyhow::Result;
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Raw outcome of a tracker call.
///
/// Write operations hand this back untouched; the caller decides whether the
/// status counts as applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// 200, 201 and 204 all mean the tracker took the write.
    pub fn is_applied(&self) -> bool {
        matches!(self.status, 200 | 201 | 204)
    }

    /// Body as JSON. Syntax errors carry the line and column.
    pub fn json(&self) -> Result<Value> {
        self.parse()
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            FeatsyncError::malformed_input(format!("response body is not valid JSON: {e}"))
                .with_context("line", e.line().to_string())
                .with_context("column", e.column().to_string())
                .into()
        })
    }
}

/// Issue-level operations the reconciliation engine relies on.
pub trait IssueTracker {
    fn get_issue(&self, key: &IssueKey) -> Result<HttpResponse>;

    /// `payload` must be a Jira edit document holding an `update` object.
    fn update_issue(&self, key: &IssueKey, payload: &Value) -> Result<HttpResponse>;

    fn create_link(&self, from: &IssueKey, to: &IssueKey, link_type: &str)
    -> Result<HttpResponse>;

    /// Fetch an issue and make sure it is a test.
    ///
    /// Any status other than 200 is a `RemoteLookup` failure; an issue whose
    /// type is not `Test` is `NotATest`. Both end a run.
    fn fetch_test(&self, key: &IssueKey) -> Result<Value> {
        let resp = self.get_issue(key)?;
        if !resp.is_ok() {
            return Err(FeatsyncError::remote_lookup(format!(
                "fetching {key} returned {}",
                resp.status
            ))
            .with_context("body", resp.body)
            .into());
        }
        let issue = resp.json()?;
        let issue_type = issue
            .pointer("/fields/issuetype/name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if issue_type != "Test" {
            return Err(FeatsyncError::not_a_test(key.as_str(), issue_type).into());
        }
        Ok(issue)
    }
}

/// A test execution as listed under a test plan.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ExecutionRef {
    pub key: IssueKey,
    #[serde(default)]
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Evidence {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileURL")]
    pub file_url: String,
}

/// One test run inside an execution, with its evidences and defects.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TestRun {
    pub key: IssueKey,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub evidences: Vec<Evidence>,
    #[serde(default)]
    pub defects: Vec<Value>,
}

/// Read side used by the execution reports.
pub trait ExecutionSource {
    /// Browser link to an issue.
    fn browse_url(&self, key: &IssueKey) -> String;

    fn test_plans_in_release(&self, release: &str) -> Result<Vec<IssueKey>>;

    /// `fields` of a single issue, as returned by a key search.
    fn issue_fields(&self, key: &IssueKey, fields: &[&str]) -> Result<Value>;

    fn executions_of_plan(&self, plan: &IssueKey) -> Result<Vec<ExecutionRef>>;

    fn tests_in_execution(&self, execution: &IssueKey) -> Result<Vec<TestRun>>;

    /// Save an attachment to `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use featsync_error::{ErrorKind, kind_of};

    #[test]
    fn applied_statuses() {
        assert!(HttpResponse::new(204, "").is_applied());
        assert!(HttpResponse::new(201, "{}").is_applied());
        assert!(HttpResponse::new(200, "{}").is_applied());
        assert!(!HttpResponse::new(400, "bad").is_applied());
        assert!(!HttpResponse::new(204, "").is_ok());
    }

    #[test]
    fn json_reports_line_and_column() {
        let resp = HttpResponse::new(200, "{\n  \"key\": }");
        let err = resp.json().unwrap_err();
        assert_eq!(kind_of(&err), Some(ErrorKind::MalformedInput));
        let text = err.to_string();
        assert!(text.contains("line=2"), "{text}");
        assert!(text.contains("column="), "{text}");
    }

    #[test]
    fn test_run_reads_xray_field_names() {
        let run: TestRun = serde_json::from_str(
            r#"{"key":"PFWES-2","status":"PASS","evidences":[{"fileName":"a.png","fileURL":"http://x/a.png","id":3}],"defects":[]}"#,
        )
        .unwrap();
        assert_eq!(run.key, IssueKey::new("PFWES-2"));
        assert_eq!(run.evidences[0].file_name, "a.png");
        assert_eq!(run.evidences[0].file_url, "http://x/a.png");
    }
}
