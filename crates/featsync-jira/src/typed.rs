//! Issue-type specific helpers: tests, stories, epics and test plans.

use crate::JiraClient;
use crate::search::SearchRequest;
use anyhow::Result;
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use featsync_ports::HttpResponse;
use serde_json::{Map, Value, json};

pub const TEST: &str = "Test";
pub const STORY: &str = "Story";
pub const EPIC: &str = "Epic";

/// A Cucumber test as stored in the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTest {
    pub name: String,
    /// Scenario keyword (`Scenario`, `Scenario Outline`).
    pub test_type: String,
    pub scenario: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Story {
    pub title: String,
    pub description: String,
    pub epic: Option<IssueKey>,
    pub role: String,
    pub action: String,
    pub benefit: String,
}

impl JiraClient {
    fn test_fields(&self, test: &NewTest) -> Map<String, Value> {
        let f = self.fields();
        let mut fields = Map::new();
        fields.insert("summary".into(), json!(test.name));
        fields.insert("description".into(), json!(""));
        fields.insert(f.test_kind.clone(), json!({"value": "Cucumber"}));
        fields.insert(f.scenario_type.clone(), json!({"value": test.test_type}));
        fields.insert(f.scenario.clone(), json!(test.scenario));
        fields
    }

    fn story_fields(&self, story: &Story) -> Map<String, Value> {
        let f = self.fields();
        let mut fields = Map::new();
        fields.insert("summary".into(), json!(story.title));
        fields.insert("description".into(), json!(story.description));
        fields.insert(f.story_epic.clone(), json!(story.epic));
        fields.insert(f.story_role.clone(), json!(story.role));
        fields.insert(f.story_action.clone(), json!(story.action));
        fields.insert(f.story_benefit.clone(), json!(story.benefit));
        fields
    }

    fn with_project_and_type(
        &self,
        mut fields: Map<String, Value>,
        issue_type: &str,
    ) -> Result<Value> {
        let project = self.selected_project()?.to_string();
        let type_id = self.issue_type_id(issue_type)?;
        fields.insert("project".into(), json!({"id": project}));
        fields.insert("issuetype".into(), json!({"id": type_id}));
        Ok(json!({ "fields": fields }))
    }

    /// Create a Cucumber test and link it to `story` with `Tests`.
    ///
    /// Returns the new key and the link response.
    pub fn add_test(&self, story: &IssueKey, test: &NewTest) -> Result<(IssueKey, HttpResponse)> {
        let payload = self.with_project_and_type(self.test_fields(test), TEST)?;
        tracing::debug!(%payload, "create test");
        let created = self.create_issue(&payload)?;
        if !created.is_applied() {
            return Err(FeatsyncError::remote_lookup(format!(
                "creating test '{}' returned {}",
                test.name, created.status
            ))
            .with_context("body", created.body)
            .into());
        }
        let key = created
            .json()?
            .get("key")
            .and_then(Value::as_str)
            .map(IssueKey::new)
            .ok_or_else(|| FeatsyncError::malformed_input("created issue has no key"))?;
        let link = self.create_link(&key, story, "Tests")?;
        Ok((key, link))
    }

    /// Rewrite summary, kind, type and scenario text of an existing test.
    pub fn update_test(&self, key: &IssueKey, test: &NewTest) -> Result<HttpResponse> {
        let payload = json!({"update": {}, "fields": self.test_fields(test)});
        self.update_issue(key, &payload)
    }

    pub fn create_story(&self, story: &Story) -> Result<HttpResponse> {
        let payload = self.with_project_and_type(self.story_fields(story), STORY)?;
        self.create_issue(&payload)
    }

    pub fn update_story(&self, key: &IssueKey, story: &Story) -> Result<HttpResponse> {
        let payload = json!({"update": {}, "fields": self.story_fields(story)});
        self.update_issue(key, &payload)
    }

    /// `(key, epic name)` of every epic in the selected project.
    pub fn epics(&self) -> Result<Vec<(IssueKey, String)>> {
        let project = self.selected_project()?;
        let epic_name = self.fields().epic_name.clone();
        let request = SearchRequest::new(
            format!("project = {project} AND type = Epic"),
            &["key", epic_name.as_str()],
        );
        Ok(self
            .search_all(&request)?
            .iter()
            .filter_map(|issue| {
                let key = issue.get("key")?.as_str()?;
                let name = issue
                    .get("fields")
                    .and_then(|f| f.get(&epic_name))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some((IssueKey::new(key), name.to_string()))
            })
            .collect())
    }

    pub fn add_epic(&self, name: &str, summary: &str) -> Result<HttpResponse> {
        let mut fields = Map::new();
        fields.insert("summary".into(), json!(summary));
        fields.insert(self.fields().epic_name.clone(), json!(name));
        let payload = self.with_project_and_type(fields, EPIC)?;
        self.create_issue(&payload)
    }

    /// Keys of the test plans whose fix version is `release`.
    pub fn test_plans_in_release(&self, release: &str) -> Result<Vec<IssueKey>> {
        let request = SearchRequest::new(
            format!("fixVersion=\"{release}\" AND issueType = \"Test Plan\""),
            &["key"],
        );
        Ok(self
            .search_all(&request)?
            .iter()
            .filter_map(|issue| issue.get("key")?.as_str().map(IssueKey::new))
            .collect())
    }
}
