//! Tests for featsync-ports crate.

use featsync_error::{ErrorKind, kind_of};
use featsync_ids::IssueKey;
use featsync_ports::{HttpResponse, IssueTracker};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::cell::RefCell;

/// Mock tracker that answers every lookup with a fixed response.
struct MockTracker {
    issue: HttpResponse,
    updates: RefCell<Vec<(String, Value)>>,
}

impl MockTracker {
    fn answering(status: u16, body: Value) -> Self {
        Self {
            issue: HttpResponse::new(status, body.to_string()),
            updates: RefCell::new(Vec::new()),
        }
    }
}

impl IssueTracker for MockTracker {
    fn get_issue(&self, _key: &IssueKey) -> anyhow::Result<HttpResponse> {
        Ok(self.issue.clone())
    }

    fn update_issue(&self, key: &IssueKey, payload: &Value) -> anyhow::Result<HttpResponse> {
        self.updates
            .borrow_mut()
            .push((key.to_string(), payload.clone()));
        Ok(HttpResponse::new(204, ""))
    }

    fn create_link(
        &self,
        _from: &IssueKey,
        _to: &IssueKey,
        _link_type: &str,
    ) -> anyhow::Result<HttpResponse> {
        Ok(HttpResponse::new(201, ""))
    }
}

fn key() -> IssueKey {
    IssueKey::new("PFWES-2")
}

#[test]
fn fetch_test_returns_test_issue() {
    let tracker = MockTracker::answering(
        200,
        json!({"key": "PFWES-2", "fields": {"issuetype": {"name": "Test"}}}),
    );
    let issue = tracker.fetch_test(&key()).unwrap();
    assert_eq!(issue["key"], "PFWES-2");
}

#[test]
fn fetch_test_rejects_other_issue_types() {
    let tracker = MockTracker::answering(
        200,
        json!({"key": "PFWES-2", "fields": {"issuetype": {"name": "Story"}}}),
    );
    let err = tracker.fetch_test(&key()).unwrap_err();
    assert_eq!(kind_of(&err), Some(ErrorKind::NotATest));
}

#[test]
fn fetch_test_fails_on_lookup_status() {
    let tracker = MockTracker::answering(404, json!({"errorMessages": ["Issue does not exist"]}));
    let err = tracker.fetch_test(&key()).unwrap_err();
    assert_eq!(kind_of(&err), Some(ErrorKind::RemoteLookup));
    assert!(err.to_string().contains("404"));
}

#[test]
fn fetch_test_without_issue_type_is_not_a_test() {
    let tracker = MockTracker::answering(200, json!({"key": "PFWES-2", "fields": {}}));
    let err = tracker.fetch_test(&key()).unwrap_err();
    assert_eq!(kind_of(&err), Some(ErrorKind::NotATest));
}

#[test]
fn trait_objects_are_usable() {
    let tracker = MockTracker::answering(200, json!({}));
    let port: &dyn IssueTracker = &tracker;
    let resp = port
        .update_issue(&key(), &json!({"update": {"summary": [{"set": "T"}]}}))
        .unwrap();
    assert!(resp.is_applied());
    assert_eq!(tracker.updates.borrow().len(), 1);
    assert!(
        port.create_link(&key(), &IssueKey::new("PFWES-1"), "Tests")
            .unwrap()
            .is_applied()
    );
}

proptest! {
    #[test]
    fn only_success_codes_are_applied(status in 100u16..600) {
        let applied = HttpResponse::new(status, "").is_applied();
        prop_assert_eq!(applied, status == 200 || status == 201 || status == 204);
    }
}
