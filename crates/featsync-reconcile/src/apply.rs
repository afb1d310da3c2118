use crate::Reconciler;
use anyhow::Result;
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use featsync_ports::{HttpResponse, IssueTracker};
use featsync_schema::{ChangeSet, ChangeValue, LogicalField};
use featsync_tree::FieldPath;
use serde::Serialize;
use serde_json::{Value, json};

/// Result of pushing one field (or one link) to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOutcome {
    pub path: String,
    pub field: LogicalField,
    /// Story on the other end, for link creation.
    pub target: Option<IssueKey>,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl FieldOutcome {
    pub fn is_applied(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|s| matches!(s, 200 | 201 | 204))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub key: Option<IssueKey>,
    pub outcomes: Vec<FieldOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }
}

/// Update payload for one queued change.
///
/// `/fields/<name>` becomes `{"update": {"<name>": [...]}}`. Link changes are
/// not field updates and give `None`.
pub fn build_payload(path: &str, value: &ChangeValue) -> Result<Option<Value>> {
    let operations = match value {
        ChangeValue::Set(text) => json!([{ "set": text }]),
        ChangeValue::SetOption(option) => json!([{ "set": { "value": option } }]),
        ChangeValue::Labels(delta) => Value::Array(
            delta
                .add
                .iter()
                .map(|label| json!({ "add": label }))
                .chain(delta.remove.iter().map(|label| json!({ "remove": label })))
                .collect(),
        ),
        ChangeValue::Link(_) => return Ok(None),
    };
    let target = FieldPath::parse(path).rebase("fields", "update");
    if target.segments().first().map(String::as_str) != Some("update") {
        return Err(
            FeatsyncError::field_update(format!("'{path}' is not an issue field"))
                .with_context("path", path)
                .into(),
        );
    }
    Ok(Some(featsync_tree::new(&target.to_string(), operations)?))
}

impl Reconciler {
    /// Push `changes` to issue `key`, one call per field.
    ///
    /// Each call stands alone: a failure is logged and recorded, and nothing
    /// already applied is rolled back.
    pub fn apply<T>(&self, tracker: &T, key: &IssueKey, changes: &ChangeSet) -> ApplyReport
    where
        T: IssueTracker + ?Sized,
    {
        let mut report = ApplyReport {
            key: Some(key.clone()),
            outcomes: Vec::new(),
        };
        for (path, change) in changes.iter() {
            if let ChangeValue::Link(stories) = &change.value {
                if stories.is_empty() {
                    tracing::warn!(test = %key, "no story tag to link the test to");
                }
                for story in stories {
                    let result = tracker.create_link(key, story, &self.link_type);
                    report.outcomes.push(outcome(key, path, change.field, Some(story), result));
                }
                continue;
            }
            let result = build_payload(path, &change.value).and_then(|payload| {
                let payload = payload.ok_or_else(|| {
                    FeatsyncError::field_update(format!("nothing to send for '{path}'"))
                })?;
                tracker.update_issue(key, &payload)
            });
            report.outcomes.push(outcome(key, path, change.field, None, result));
        }
        report
    }
}

fn outcome(
    key: &IssueKey,
    path: &str,
    field: LogicalField,
    target: Option<&IssueKey>,
    result: Result<HttpResponse>,
) -> FieldOutcome {
    let (status, error) = match result {
        Ok(resp) if resp.is_applied() => {
            tracing::info!(test = %key, field = %field, status = resp.status, "field updated");
            (Some(resp.status), None)
        }
        Ok(resp) => {
            tracing::warn!(
                test = %key,
                field = %field,
                status = resp.status,
                body = %resp.body,
                "field update rejected"
            );
            (Some(resp.status), Some(resp.body))
        }
        Err(e) => {
            tracing::warn!(test = %key, field = %field, error = %e, "field update failed");
            (None, Some(format!("{e:#}")))
        }
    };
    FieldOutcome {
        path: path.to_string(),
        field,
        target: target.cloned(),
        status,
        error,
    }
}
