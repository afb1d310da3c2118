use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fields of the local model that can be compared with a remote issue.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    Description,
    StoryTags,
    Precondition,
    ScenarioId,
    Labels,
    #[serde(rename = "type")]
    Type,
    Title,
    Scenario,
    Examples,
}

impl LogicalField {
    pub const FEATURE_LEVEL: [LogicalField; 3] =
        [Self::Description, Self::StoryTags, Self::Precondition];

    pub const SCENARIO_LEVEL: [LogicalField; 6] = [
        Self::ScenarioId,
        Self::Labels,
        Self::Type,
        Self::Title,
        Self::Scenario,
        Self::Examples,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::StoryTags => "story_tags",
            Self::Precondition => "precondition",
            Self::ScenarioId => "scenario_id",
            Self::Labels => "labels",
            Self::Type => "type",
            Self::Title => "title",
            Self::Scenario => "scenario",
            Self::Examples => "examples",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_TYPE_FIELD: &str = "customfield_10203";
pub const DEFAULT_SCENARIO_FIELD: &str = "customfield_10204";

/// Where each logical field lives in the remote issue document.
///
/// Fields without an entry are unmapped: the engine logs and skips them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<LogicalField, String>);

impl Default for FieldMapping {
    fn default() -> Self {
        Self::with_custom_fields(DEFAULT_TYPE_FIELD, DEFAULT_SCENARIO_FIELD)
    }
}

impl FieldMapping {
    /// Default table with the two select/text custom field ids swapped in.
    pub fn with_custom_fields(type_field: &str, scenario_field: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(LogicalField::Description, "/fields/description".to_string());
        map.insert(LogicalField::StoryTags, "/fields/issuelinks".to_string());
        map.insert(LogicalField::ScenarioId, "key".to_string());
        map.insert(LogicalField::Labels, "/fields/labels".to_string());
        map.insert(LogicalField::Type, format!("/fields/{type_field}"));
        map.insert(LogicalField::Title, "/fields/summary".to_string());
        map.insert(LogicalField::Scenario, format!("/fields/{scenario_field}"));
        Self(map)
    }

    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn path(&self, field: LogicalField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_mapped(&self, field: LogicalField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn map(mut self, field: LogicalField, path: impl Into<String>) -> Self {
        self.0.insert(field, path.into());
        self
    }

    pub fn unmap(mut self, field: LogicalField) -> Self {
        self.0.remove(&field);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, &str)> {
        self.0.iter().map(|(f, p)| (*f, p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let m = FieldMapping::default();
        assert_eq!(m.path(LogicalField::Description), Some("/fields/description"));
        assert_eq!(m.path(LogicalField::StoryTags), Some("/fields/issuelinks"));
        assert_eq!(m.path(LogicalField::ScenarioId), Some("key"));
        assert_eq!(m.path(LogicalField::Labels), Some("/fields/labels"));
        assert_eq!(m.path(LogicalField::Type), Some("/fields/customfield_10203"));
        assert_eq!(m.path(LogicalField::Title), Some("/fields/summary"));
        assert_eq!(m.path(LogicalField::Scenario), Some("/fields/customfield_10204"));
        assert!(!m.is_mapped(LogicalField::Precondition));
        assert!(!m.is_mapped(LogicalField::Examples));
    }

    #[test]
    fn custom_field_ids() {
        let m = FieldMapping::with_custom_fields("customfield_1", "customfield_2");
        assert_eq!(m.path(LogicalField::Type), Some("/fields/customfield_1"));
        assert_eq!(m.path(LogicalField::Scenario), Some("/fields/customfield_2"));
    }

    #[test]
    fn map_and_unmap() {
        let m = FieldMapping::default()
            .map(LogicalField::Examples, "/fields/customfield_9")
            .unmap(LogicalField::Title);
        assert_eq!(m.path(LogicalField::Examples), Some("/fields/customfield_9"));
        assert!(!m.is_mapped(LogicalField::Title));
    }

    #[test]
    fn yaml_uses_logical_names() {
        let yaml = "type: /fields/customfield_5\ntitle: /fields/summary\n";
        let m: FieldMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(m.path(LogicalField::Type), Some("/fields/customfield_5"));
        assert_eq!(m.iter().count(), 2);
    }
}
