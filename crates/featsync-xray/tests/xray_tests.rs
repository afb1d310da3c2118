//! Xray endpoints against a mock server.

use featsync_ids::IssueKey;
use featsync_jira::JiraClient;
use featsync_ports::ExecutionSource;
use featsync_xray::XrayClient;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

fn xray(uri: &str) -> XrayClient {
    XrayClient::new(JiraClient::new(uri, "alice", "secret").unwrap())
}

#[tokio::test]
async fn execution_runs_are_read_in_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/raven/1.0/api/testexec/PFWES-50/test"))
        .and(query_param("detailed", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "key": "PFWES-2", "status": "PASS", "evidences": [], "defects": []},
            {"id": 2, "key": "PFWES-3", "status": "FAIL",
             "evidences": [{"fileName": "err.png", "fileURL": "http://x/err.png"}],
             "defects": [{"key": "PFWES-99"}]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let runs = blocking(move || xray(&uri).tests_in_execution(&IssueKey::new("PFWES-50")))
        .await
        .unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].status, "FAIL");
    assert_eq!(runs[1].evidences[0].file_name, "err.png");
    assert_eq!(runs[1].defects.len(), 1);
}

#[tokio::test]
async fn import_attaches_execution_to_plan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/raven/1.0/import/execution/cucumber"))
        .and(body_json(json!([{"id": "login", "elements": []}])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"testExecIssue": {"key": "PFWES-50"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/PFWES-50"))
        .and(body_json(json!({
            "update": {},
            "fields": {"customfield_10228": ["PFWES-40"], "summary": "nightly"}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("cucumber.json");
    std::fs::write(&report, r#"[{"id": "login", "elements": []}]"#).unwrap();

    let uri = server.uri();
    let outcome = blocking(move || {
        xray(&uri).import_execution_to_test_plan(&IssueKey::new("PFWES-40"), &report, "nightly")
    })
    .await
    .unwrap();
    assert_eq!(outcome.execution, IssueKey::new("PFWES-50"));
    assert!(outcome.update.is_applied());
}

#[tokio::test]
async fn evidences_are_uploaded_per_test_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/raven/1.0/api/testrun"))
        .and(query_param("testExecIssueKey", "PFWES-50"))
        .and(query_param("testIssueKey", "PFWES-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 77})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/raven/1.0/api/testrun/77/attachment"))
        .and(body_partial_json(json!({
            "data": "c2hvdA==",
            "filename": "a.png",
            "contentType": "application/msword"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let shot = dir.path().join("a.png");
    std::fs::write(&shot, "shot").unwrap();
    let evidences = BTreeMap::from([(IssueKey::new("PFWES-2"), vec![shot])]);

    let uri = server.uri();
    let responses = blocking(move || {
        xray(&uri).load_attachments(&IssueKey::new("PFWES-50"), &evidences)
    })
    .await
    .unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].is_ok());
}

#[tokio::test]
async fn plans_of_a_release_come_from_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/2/search"))
        .and(body_partial_json(json!({
            "jql": "fixVersion=\"R1\" AND issueType = \"Test Plan\""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0, "maxResults": 50, "total": 1,
            "issues": [{"key": "PFWES-40"}]
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let plans = blocking(move || xray(&uri).test_plans_in_release("R1"))
        .await
        .unwrap();
    assert_eq!(plans, vec![IssueKey::new("PFWES-40")]);
}
