//! Behave "plain" execution logs.

use featsync_ooxml::{Document, Run};
use itertools::Itertools;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static FEATURE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Feature").expect("feature line pattern is valid"));
static SCENARIO_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Scenario").expect("scenario line pattern is valid"));
/// `1 feature passed, 0 failed, 0 skipped` and friends.
static TOTALS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+ (features?|scenarios?|steps?) passed, \d+ failed")
        .expect("totals line pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    pub feature: String,
    pub scenario: String,
    pub status: ScenarioStatus,
}

/// A log line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Feature(String),
    Scenario(String),
    /// Step or totals line carrying a status word.
    Status(String),
    Text(String),
}

/// A parsed log: its lines in order and one result per scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionLog {
    pub lines: Vec<LogLine>,
    pub results: Vec<ScenarioResult>,
}

impl ExecutionLog {
    /// Results sorted by feature, then scenario.
    pub fn sorted_results(&self) -> Vec<&ScenarioResult> {
        self.results
            .iter()
            .sorted_by(|a, b| (&a.feature, &a.scenario).cmp(&(&b.feature, &b.scenario)))
            .collect()
    }

    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

#[derive(Default)]
struct Cursor {
    feature: Option<String>,
    scenario: Option<String>,
    status: Option<ScenarioStatus>,
}

impl Cursor {
    /// Record the open scenario, if any, with the last status seen.
    fn close_scenario(&mut self, results: &mut Vec<ScenarioResult>) {
        if let Some(scenario) = self.scenario.take() {
            results.push(ScenarioResult {
                feature: self.feature.clone().unwrap_or_default(),
                scenario,
                status: self.status.take().unwrap_or(ScenarioStatus::Skipped),
            });
        }
        self.status = None;
    }
}

/// Text after the first `:` of a heading line, trimmed.
fn heading_name(line: &str) -> String {
    line.split(':').nth(1).unwrap_or_default().trim().to_string()
}

/// Parse a behave plain log.
///
/// A scenario takes the status of the last `passed` or `failed` line seen
/// inside it and is `skipped` when there is none. The totals printed at the
/// end of a run close the last scenario instead of changing its status.
pub fn parse_plain_log(text: &str) -> ExecutionLog {
    let mut log = ExecutionLog::default();
    let mut cursor = Cursor::default();

    for raw in text.lines() {
        let line = raw.trim_end();
        if FEATURE_LINE.is_match(line) {
            cursor.close_scenario(&mut log.results);
            cursor.feature = Some(heading_name(line));
            log.lines.push(LogLine::Feature(line.to_string()));
        } else if SCENARIO_LINE.is_match(line) {
            cursor.close_scenario(&mut log.results);
            cursor.scenario = Some(heading_name(line));
            log.lines.push(LogLine::Scenario(line.to_string()));
        } else if TOTALS_LINE.is_match(line) {
            cursor.close_scenario(&mut log.results);
            log.lines.push(LogLine::Status(line.to_string()));
        } else if line.contains("passed") {
            cursor.status = Some(ScenarioStatus::Passed);
            log.lines.push(LogLine::Status(line.to_string()));
        } else if line.contains("failed") {
            cursor.status = Some(ScenarioStatus::Failed);
            log.lines.push(LogLine::Status(line.to_string()));
        } else {
            log.lines.push(LogLine::Text(line.to_string()));
        }
    }
    cursor.close_scenario(&mut log.results);

    tracing::debug!(
        scenarios = log.results.len(),
        failed = log.count(ScenarioStatus::Failed),
        "parsed execution log"
    );
    log
}

/// Append the `Last Execution report` and `Last Execution summary` sections.
pub fn add_execution_log(doc: &mut Document, log: &ExecutionLog) {
    doc.add_heading("Last Execution report", 1);
    let mut first_feature = true;
    for line in &log.lines {
        match line {
            LogLine::Feature(text) => {
                if !first_feature {
                    doc.add_page_break();
                }
                first_feature = false;
                doc.add_heading(text, 2);
            }
            LogLine::Scenario(text) => doc.add_heading(text, 3),
            LogLine::Status(text) | LogLine::Text(text) => doc.add_compact(&[Run::plain(text)]),
        }
    }

    doc.add_page_break();
    doc.add_heading("Last Execution summary", 1);
    let rows: Vec<Vec<String>> = log
        .sorted_results()
        .into_iter()
        .map(|r| vec![r.feature.clone(), r.scenario.clone(), r.status.to_string()])
        .collect();
    doc.add_table(&["Feature", "Scenario", "Status"], &rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Feature: Login
  Scenario: valid user
    Given a registered user ... passed in 0.001s
    When the user logs in ... passed in 0.002s
  Scenario: wrong password
    Given a registered user ... passed in 0.001s
    When the password is wrong ... failed in 0.004s
    Then the error shows ... skipped in 0.000s

Feature: Account
  Scenario: not run yet
    Given a user ... skipped in 0.000s
  Scenario: close account
    Given a user ... passed in 0.001s

1 feature passed, 1 failed, 0 skipped
3 scenarios passed, 1 failed, 0 skipped
";

    fn result(feature: &str, scenario: &str, status: ScenarioStatus) -> ScenarioResult {
        ScenarioResult {
            feature: feature.to_string(),
            scenario: scenario.to_string(),
            status,
        }
    }

    #[test]
    fn last_status_line_wins_and_the_final_scenario_is_kept() {
        let log = parse_plain_log(LOG);
        assert_eq!(
            log.results,
            vec![
                result("Login", "valid user", ScenarioStatus::Passed),
                result("Login", "wrong password", ScenarioStatus::Failed),
                result("Account", "not run yet", ScenarioStatus::Skipped),
                result("Account", "close account", ScenarioStatus::Passed),
            ]
        );
        assert_eq!(log.count(ScenarioStatus::Passed), 2);
    }

    #[test]
    fn final_scenario_without_totals_is_recorded() {
        let log = parse_plain_log("Feature: F\n  Scenario: only\n    Given x ... failed\n");
        assert_eq!(log.results, vec![result("F", "only", ScenarioStatus::Failed)]);
    }

    #[test]
    fn lines_are_classified() {
        let log = parse_plain_log("Feature: F\n  Scenario: S\n    Given x ... passed\nnoise\n");
        assert_eq!(
            log.lines,
            vec![
                LogLine::Feature("Feature: F".into()),
                LogLine::Scenario("  Scenario: S".into()),
                LogLine::Status("    Given x ... passed".into()),
                LogLine::Text("noise".into()),
            ]
        );
    }

    #[test]
    fn summary_table_is_sorted() {
        let log = parse_plain_log(LOG);
        let mut doc = Document::new();
        add_execution_log(&mut doc, &log);
        let text = doc.text();
        assert_eq!(text[0], "Last Execution report");
        assert!(text.iter().any(|t| t == "Last Execution summary"));
        let table: Vec<&String> = text
            .iter()
            .skip_while(|t| *t != "Feature | Scenario | Status")
            .collect();
        assert_eq!(
            table,
            vec![
                "Feature | Scenario | Status",
                "Account | close account | passed",
                "Account | not run yet | skipped",
                "Login | valid user | passed",
                "Login | wrong password | failed",
            ]
        );
    }

    #[test]
    fn empty_log_has_no_results() {
        let log = parse_plain_log("");
        assert!(log.results.is_empty());
        assert!(log.lines.is_empty());
    }
}
