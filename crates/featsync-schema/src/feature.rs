use featsync_ids::IssueKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One scenario flattened for synchronisation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalScenario {
    /// Key of the test issue this scenario is synchronised with.
    pub scenario_id: IssueKey,
    pub labels: BTreeSet<String>,
    /// Gherkin keyword of the block (`Scenario`, `Scenario Outline`, ...).
    #[serde(rename = "type")]
    pub scenario_type: String,
    pub title: String,
    /// Rendered steps, followed by the rendered examples for outlines.
    pub scenario: String,
    pub examples: Option<String>,
}

/// One feature file flattened for synchronisation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalFeature {
    pub description: String,
    /// Keys of the stories covered by this feature, in tag order.
    pub story_tags: Vec<IssueKey>,
    pub precondition: Option<String>,
    pub scenarios: Vec<LocalScenario>,
}

impl LocalFeature {
    /// Comma-joined story keys, for display and API boundaries only.
    pub fn story_tags_joined(&self) -> String {
        self.story_tags
            .iter()
            .map(IssueKey::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
