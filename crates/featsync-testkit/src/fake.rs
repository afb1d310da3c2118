//! In-memory implementations of the tracker ports.

use anyhow::Result;
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use featsync_ports::{ExecutionRef, ExecutionSource, HttpResponse, IssueTracker, TestRun};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Tracker holding issues in memory and recording every write.
#[derive(Debug, Default)]
pub struct FakeTracker {
    issues: BTreeMap<IssueKey, HttpResponse>,
    rejected_fields: BTreeSet<String>,
    updates: RefCell<Vec<(IssueKey, Value)>>,
    links: RefCell<Vec<(IssueKey, IssueKey, String)>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `issue` (keyed by its `key`) with status 200.
    pub fn with_issue(mut self, issue: Value) -> Self {
        let key = IssueKey::new(issue["key"].as_str().unwrap_or_default());
        self.issues
            .insert(key, HttpResponse::new(200, issue.to_string()));
        self
    }

    /// Answer lookups of `key` with a bare status.
    pub fn with_status(mut self, key: &str, status: u16) -> Self {
        self.issues
            .insert(IssueKey::new(key), HttpResponse::new(status, "{\"errorMessages\":[]}"));
        self
    }

    /// Refuse (400) any update touching `update.<field>`.
    pub fn rejecting(mut self, field: &str) -> Self {
        self.rejected_fields.insert(field.to_string());
        self
    }

    pub fn updates(&self) -> Vec<(IssueKey, Value)> {
        self.updates.borrow().clone()
    }

    pub fn links(&self) -> Vec<(IssueKey, IssueKey, String)> {
        self.links.borrow().clone()
    }

    /// Number of writes of any kind.
    pub fn writes(&self) -> usize {
        self.updates.borrow().len() + self.links.borrow().len()
    }
}

impl IssueTracker for FakeTracker {
    fn get_issue(&self, key: &IssueKey) -> Result<HttpResponse> {
        Ok(self.issues.get(key).cloned().unwrap_or_else(|| {
            HttpResponse::new(404, json!({"errorMessages": ["Issue Does Not Exist"]}).to_string())
        }))
    }

    fn update_issue(&self, key: &IssueKey, payload: &Value) -> Result<HttpResponse> {
        let Some(update) = payload.get("update").and_then(Value::as_object) else {
            return Err(
                FeatsyncError::malformed_input("the payload must contain the 'update' key").into(),
            );
        };
        self.updates.borrow_mut().push((key.clone(), payload.clone()));
        if update.keys().any(|k| self.rejected_fields.contains(k)) {
            return Ok(HttpResponse::new(
                400,
                json!({"errors": {"field": "cannot be set"}}).to_string(),
            ));
        }
        Ok(HttpResponse::new(204, ""))
    }

    fn create_link(&self, from: &IssueKey, to: &IssueKey, link_type: &str) -> Result<HttpResponse> {
        self.links
            .borrow_mut()
            .push((from.clone(), to.clone(), link_type.to_string()));
        Ok(HttpResponse::new(201, ""))
    }
}

/// Execution data served from memory. Downloads write the URL as file content.
#[derive(Debug, Default)]
pub struct FakeExecutionSource {
    pub base_url: String,
    pub releases: BTreeMap<String, Vec<IssueKey>>,
    pub fields: BTreeMap<IssueKey, Value>,
    pub executions: BTreeMap<IssueKey, Vec<ExecutionRef>>,
    pub runs: BTreeMap<IssueKey, Vec<TestRun>>,
    downloads: RefCell<Vec<String>>,
}

impl FakeExecutionSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_release(mut self, release: &str, plans: &[&str]) -> Self {
        self.releases
            .insert(release.to_string(), plans.iter().map(|p| IssueKey::new(*p)).collect());
        self
    }

    pub fn with_fields(mut self, key: &str, fields: Value) -> Self {
        self.fields.insert(IssueKey::new(key), fields);
        self
    }

    pub fn with_executions(mut self, plan: &str, executions: &[(&str, &str)]) -> Self {
        self.executions.insert(
            IssueKey::new(plan),
            executions
                .iter()
                .map(|(key, summary)| ExecutionRef {
                    key: IssueKey::new(*key),
                    summary: summary.to_string(),
                })
                .collect(),
        );
        self
    }

    /// Runs as the detailed execution listing would return them.
    pub fn with_runs(mut self, execution: &str, runs: Value) -> Self {
        let runs: Vec<TestRun> = serde_json::from_value(runs).unwrap();
        self.runs.insert(IssueKey::new(execution), runs);
        self
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

impl ExecutionSource for FakeExecutionSource {
    fn browse_url(&self, key: &IssueKey) -> String {
        format!("{}/browse/{key}", self.base_url)
    }

    fn test_plans_in_release(&self, release: &str) -> Result<Vec<IssueKey>> {
        Ok(self.releases.get(release).cloned().unwrap_or_default())
    }

    fn issue_fields(&self, key: &IssueKey, _fields: &[&str]) -> Result<Value> {
        self.fields
            .get(key)
            .cloned()
            .ok_or_else(|| FeatsyncError::not_found(format!("no issue {key}")).into())
    }

    fn executions_of_plan(&self, plan: &IssueKey) -> Result<Vec<ExecutionRef>> {
        Ok(self.executions.get(plan).cloned().unwrap_or_default())
    }

    fn tests_in_execution(&self, execution: &IssueKey) -> Result<Vec<TestRun>> {
        Ok(self.runs.get(execution).cloned().unwrap_or_default())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.downloads.borrow_mut().push(url.to_string());
        std::fs::write(dest, url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_issue_is_404() {
        let tracker = FakeTracker::new();
        let resp = tracker.get_issue(&IssueKey::new("PFWES-1")).unwrap();
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn rejected_fields_answer_400() {
        let tracker = FakeTracker::new().rejecting("labels");
        let key = IssueKey::new("PFWES-2");
        let ok = tracker
            .update_issue(&key, &json!({"update": {"summary": [{"set": "T"}]}}))
            .unwrap();
        let ko = tracker
            .update_issue(&key, &json!({"update": {"labels": [{"add": "x"}]}}))
            .unwrap();
        assert!(ok.is_applied());
        assert_eq!(ko.status, 400);
        assert_eq!(tracker.updates().len(), 2);
        assert!(tracker.update_issue(&key, &json!({"fields": {}})).is_err());
    }
}
