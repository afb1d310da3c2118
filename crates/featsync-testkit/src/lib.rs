//! Small helpers for building fixtures in tests.
//!
//! Keeping these in a microcrate avoids copy-paste across the gherkin,
//! reconcile and report tests.

pub mod fake;
pub mod proptest;

pub use fake::{FakeExecutionSource, FakeTracker};

use featsync_ids::IssueKey;
use featsync_schema::{LocalFeature, LocalScenario};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// A feature file with one story, a background and an outline.
pub const LOGIN_FEATURE: &str = "@PFWES-1 @web
Feature: Login
  As a customer I want to log in.
  Business rules: three attempts.

  Background: @PFWES-5335
    Given the portal is up

  @PFWES-2 @smoke
  Scenario: valid user
    Given a registered user
    When the user logs in
    Then the dashboard opens

  @PFWES-3
  Scenario Outline: wrong password
    Given user <name>
    When the password is <password>
    Then the error <error> shows

    Examples: bad credentials
      | name  | password | error   |
      | alice | nope     | invalid |
      | bob   | x        | locked  |
";

/// Scenario carrying its own key but no story anywhere.
pub const MALFORMED_FEATURE: &str = "Feature: Orphan
  @PFWES-9
  Scenario: nobody owns me
    Given nothing
";

/// Write `text` as `<dir>/<name>` and return the path.
pub fn write_feature(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, text).unwrap();
    path
}

/// The local form of a one-scenario feature:
/// `{description "D", story PFWES-1, scenario PFWES-2 [smoke], "T", "Given a\nWhen b"}`.
pub fn local_feature() -> LocalFeature {
    LocalFeature {
        description: "D".to_string(),
        story_tags: vec![IssueKey::new("PFWES-1")],
        precondition: None,
        scenarios: vec![LocalScenario {
            scenario_id: IssueKey::new("PFWES-2"),
            labels: ["smoke".to_string()].into_iter().collect(),
            scenario_type: "Scenario".to_string(),
            title: "T".to_string(),
            scenario: "Given a\nWhen b".to_string(),
            examples: None,
        }],
    }
}

/// Builder for a remote test issue as `GET /issue/{key}` returns it.
#[derive(Debug, Clone)]
pub struct RemoteTest {
    issue: Value,
}

impl RemoteTest {
    pub fn new(key: &str) -> Self {
        Self {
            issue: json!({
                "key": key,
                "fields": {"issuetype": {"name": "Test"}, "issuelinks": [], "labels": []}
            }),
        }
    }

    /// Echo of `scenario` inside `feature`: diffing it yields no change.
    pub fn echo(feature: &LocalFeature, scenario: &LocalScenario) -> Self {
        let mut remote = Self::new(scenario.scenario_id.as_str())
            .description(&feature.description)
            .summary(&scenario.title)
            .scenario_type(&scenario.scenario_type)
            .scenario(&scenario.scenario)
            .labels(&scenario.labels.iter().map(String::as_str).collect::<Vec<_>>());
        for story in &feature.story_tags {
            remote = remote.tests_link(story.as_str());
        }
        remote
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.issue["fields"][name] = value;
        self
    }

    pub fn issue_type(self, name: &str) -> Self {
        self.field("issuetype", json!({"name": name}))
    }

    pub fn description(self, text: &str) -> Self {
        self.field("description", json!(text))
    }

    pub fn summary(self, text: &str) -> Self {
        self.field("summary", json!(text))
    }

    pub fn labels(self, labels: &[&str]) -> Self {
        self.field("labels", json!(labels))
    }

    /// Select field `customfield_10203` as `{"value": ...}`.
    pub fn scenario_type(self, value: &str) -> Self {
        self.field("customfield_10203", json!({"value": value}))
    }

    pub fn scenario(self, text: &str) -> Self {
        self.field("customfield_10204", json!(text))
    }

    /// A `Tests` link whose outward side is `story`.
    pub fn tests_link(self, story: &str) -> Self {
        self.link("Tests", story)
    }

    pub fn link(mut self, link_type: &str, outward: &str) -> Self {
        let link = json!({"type": {"name": link_type}, "outwardIssue": {"key": outward}});
        match self.issue["fields"]["issuelinks"].as_array_mut() {
            Some(links) => links.push(link),
            None => self.issue["fields"]["issuelinks"] = json!([link]),
        }
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        if let Some(fields) = self.issue["fields"].as_object_mut() {
            fields.remove(name);
        }
        self
    }

    pub fn build(self) -> Value {
        self.issue
    }
}
