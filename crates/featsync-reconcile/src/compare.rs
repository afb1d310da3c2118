use crate::Reconciler;
use featsync_ids::{IssueKey, is_precondition_key};
use featsync_schema::{
    ChangeSet, ChangeValue, LabelDelta, LocalFeature, LocalScenario, LogicalField,
};
use serde_json::Value;
use std::collections::BTreeSet;

impl Reconciler {
    /// Fields of `remote` that differ from `scenario` (and its `feature`).
    ///
    /// A field missing from `remote` compares as empty. Fields without a
    /// mapping are skipped.
    pub fn compare(
        &self,
        feature: &LocalFeature,
        scenario: &LocalScenario,
        remote: &Value,
    ) -> ChangeSet {
        let mut changes = ChangeSet::new();
        let fields = LogicalField::FEATURE_LEVEL
            .iter()
            .chain(LogicalField::SCENARIO_LEVEL.iter())
            .copied()
            .filter(|f| *f != LogicalField::ScenarioId);

        for field in fields {
            let Some(path) = self.mapping.path(field) else {
                tracing::debug!(field = %field, "field not mapped, skipped");
                continue;
            };
            let value = featsync_tree::get(remote, path);
            if value.is_none() {
                tracing::info!(
                    test = %scenario.scenario_id,
                    field = %field,
                    path,
                    "remote field not set"
                );
            }

            let change = match field {
                LogicalField::Description => text_change(&feature.description, value),
                LogicalField::Precondition => {
                    text_change(feature.precondition.as_deref().unwrap_or_default(), value)
                }
                LogicalField::Title => text_change(&scenario.title, value),
                LogicalField::Scenario => text_change(&scenario.scenario, value),
                LogicalField::Examples => {
                    text_change(scenario.examples.as_deref().unwrap_or_default(), value)
                }
                LogicalField::Type => (remote_text(value) != scenario.scenario_type)
                    .then(|| ChangeValue::SetOption(scenario.scenario_type.clone())),
                LogicalField::Labels => {
                    let delta = LabelDelta::between(&scenario.labels, &remote_labels(value));
                    (!delta.is_empty()).then_some(ChangeValue::Labels(delta))
                }
                LogicalField::StoryTags => self.link_change(&feature.story_tags, value),
                LogicalField::ScenarioId => None,
            };

            if let Some(change) = change {
                tracing::debug!(test = %scenario.scenario_id, field = %field, "field differs");
                changes.insert(path, field, change);
            }
        }
        changes
    }

    fn link_change(&self, stories: &[IssueKey], value: Option<&Value>) -> Option<ChangeValue> {
        let linked = linked_keys(value, &self.link_type);
        if linked.is_empty() {
            return Some(ChangeValue::Link(stories.to_vec()));
        }
        let missing: Vec<IssueKey> = stories
            .iter()
            .filter(|story| !linked.contains(story))
            .cloned()
            .collect();
        (!missing.is_empty()).then_some(ChangeValue::Link(missing))
    }
}

fn text_change(local: &str, value: Option<&Value>) -> Option<ChangeValue> {
    (remote_text(value) != local).then(|| ChangeValue::Set(local.to_string()))
}

/// Text of a remote field. Absent and null read as `""`; select fields read
/// their `value`.
pub fn remote_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => match map.get("value") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(map.clone()).to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Labels of a remote issue. Anything but a list reads as no labels.
pub fn remote_labels(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Keys the issue is already linked to with `link_type`.
///
/// Link objects contribute their outward then inward issue. Plain string
/// entries, as older issues store them, count when they look like a key.
pub fn linked_keys(value: Option<&Value>, link_type: &str) -> Vec<IssueKey> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut keys = Vec::new();
    for item in items {
        match item {
            Value::Object(link) => {
                let name = link.get("type").and_then(|t| t.get("name")).and_then(Value::as_str);
                if name != Some(link_type) {
                    continue;
                }
                for side in ["outwardIssue", "inwardIssue"] {
                    if let Some(key) = link
                        .get(side)
                        .and_then(|issue| issue.get("key"))
                        .and_then(Value::as_str)
                    {
                        keys.push(IssueKey::new(key));
                    }
                }
            }
            Value::String(s) if is_precondition_key(s) => keys.push(IssueKey::new(s.as_str())),
            _ => {}
        }
    }
    keys
}
