use crate::field::LogicalField;
use featsync_ids::IssueKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Incremental label update.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelDelta {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LabelDelta {
    /// `add = local - remote`, `remove = remote - local`, both sorted.
    pub fn between(local: &BTreeSet<String>, remote: &BTreeSet<String>) -> Self {
        Self {
            add: local.difference(remote).cloned().collect(),
            remove: remote.difference(local).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Apply the delta to a remote label set.
    pub fn apply_to(&self, remote: &BTreeSet<String>) -> BTreeSet<String> {
        let mut out = remote.clone();
        out.extend(self.add.iter().cloned());
        for label in &self.remove {
            out.remove(label);
        }
        out
    }
}

/// New value queued for one remote field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ChangeValue {
    /// Full replacement of a text field.
    Set(String),
    /// Full replacement of a select field.
    SetOption(String),
    Labels(LabelDelta),
    /// Story keys to link the test to.
    Link(Vec<IssueKey>),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    pub field: LogicalField,
    pub value: ChangeValue,
}

/// Changes for one scenario, keyed by remote field path.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, field: LogicalField, value: ChangeValue) {
        self.0.insert(path.into(), FieldChange { field, value });
    }

    pub fn get(&self, path: &str) -> Option<&FieldChange> {
        self.0.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.0.iter().map(|(p, c)| (p.as_str(), c))
    }

    pub fn fields(&self) -> BTreeSet<LogicalField> {
        self.0.values().map(|c| c.field).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn label_delta_between() {
        let delta = LabelDelta::between(&set(&["smoke", "ui"]), &set(&["ui", "old"]));
        assert_eq!(delta.add, vec!["smoke"]);
        assert_eq!(delta.remove, vec!["old"]);
        assert!(LabelDelta::between(&set(&["a"]), &set(&["a"])).is_empty());
    }

    #[test]
    fn changeset_keys_by_path() {
        let mut cs = ChangeSet::new();
        assert!(cs.is_empty());
        cs.insert("/fields/summary", LogicalField::Title, ChangeValue::Set("T".into()));
        cs.insert("/fields/summary", LogicalField::Title, ChangeValue::Set("T2".into()));
        assert_eq!(cs.len(), 1);
        assert_eq!(
            cs.get("/fields/summary").map(|c| &c.value),
            Some(&ChangeValue::Set("T2".into()))
        );
        assert!(cs.fields().contains(&LogicalField::Title));
    }

    #[test]
    fn change_value_json_shape() {
        let v = serde_json::to_value(ChangeValue::SetOption("Scenario".into())).unwrap();
        assert_eq!(v, serde_json::json!({"op": "set_option", "value": "Scenario"}));
    }
}
