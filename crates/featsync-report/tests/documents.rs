//! Feature and evidence documents written from files on disk.

use featsync_gherkin::parse;
use featsync_ooxml::read_part;
use featsync_report::{
    EvidenceInputs, FAILURE_HEADING, HttpExchange, feature_document, scenario_evidence,
    write_feature_document,
};
use featsync_testkit::{LOGIN_FEATURE, write_feature};
use std::path::Path;
use std::time::{Duration, SystemTime};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

fn write_png(path: &Path, seconds: u64) {
    std::fs::write(path, png(100, 50)).unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds))
        .unwrap();
}

const ACCOUNT_FEATURE: &str = "@PFWES-20
Feature: Account
  Scenario: close account
    Given a user
";

#[test]
fn repository_document_lists_features_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write_feature(dir.path(), "b/login.feature", LOGIN_FEATURE);
    write_feature(dir.path(), "a/account.feature", ACCOUNT_FEATURE);
    write_feature(dir.path(), "c/broken.feature", "Scenario: no feature\n  Given x\n");

    let doc = feature_document(dir.path(), "Portal features", Some("PFWES"), None).unwrap();
    let text = doc.text();
    assert_eq!(text[0], "Portal features");
    let account = text.iter().position(|t| t == "Account").unwrap();
    let login = text.iter().position(|t| t == "Login").unwrap();
    assert!(account < login);
    assert!(text.contains(&"Related to the user story: 'PFWES-20'".to_string()));
    assert!(!text.iter().any(|t| t.contains("no feature")));
}

#[test]
fn execution_log_is_appended_and_saved() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path().join("features");
    write_feature(&repo, "login.feature", LOGIN_FEATURE);
    let log = dir.path().join("behave.log");
    std::fs::write(
        &log,
        "Feature: Login\n  Scenario: valid user\n    Given a registered user ... passed in 0.1s\n",
    )
    .unwrap();

    let output = dir.path().join("out/features.docx");
    write_feature_document(&repo, "Docs", None, Some(&log), &output).unwrap();

    let xml = read_part(&std::fs::read(&output).unwrap(), "word/document.xml").unwrap();
    assert!(xml.contains("Last Execution report"));
    assert!(xml.contains("Last Execution summary"));
    assert!(xml.contains("valid user"));
}

#[test]
fn missing_repository_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = feature_document(&dir.path().join("nope"), "Docs", None, None).unwrap_err();
    assert_eq!(
        featsync_error::kind_of(&err),
        Some(featsync_error::ErrorKind::MissingRepository)
    );
}

#[test]
fn evidence_document_orders_screenshots_by_time() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("b-first.png"), 1_000);
    write_png(&dir.path().join("a-second.png"), 2_000);
    std::fs::write(dir.path().join("failure.txt"), "element #login not found\n").unwrap();
    std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

    let feature = parse(LOGIN_FEATURE).unwrap();
    let scenario = &feature.scenarios[0];
    let history = vec![HttpExchange {
        url: "https://portal/api/login".to_string(),
        method: "POST".to_string(),
        status_code: 200,
        ..HttpExchange::default()
    }];

    let doc = scenario_evidence(&EvidenceInputs {
        scenario: Some((&feature, scenario)),
        history: &history,
        png_dir: Some(dir.path()),
    })
    .unwrap();

    let text = doc.text();
    assert_eq!(text[0], "Feature: Login");
    assert_eq!(text[1], "Tags: PFWES-1, web");
    assert!(text.contains(&"Scenario: valid user".to_string()));
    assert!(text.contains(&"When the user logs in".to_string()));
    assert!(text.contains(&"Endpoint: https://portal/api/login".to_string()));

    let first = text.iter().position(|t| t == "[image b-first.png]").unwrap();
    let second = text.iter().position(|t| t == "[image a-second.png]").unwrap();
    assert!(first < second);
    assert_eq!(doc.image_count(), 2);

    let heading = text.iter().position(|t| t == FAILURE_HEADING).unwrap();
    assert_eq!(text[heading + 1], "element #login not found");
}
