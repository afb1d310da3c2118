//! Flattens a parsed feature into the local model used for synchronisation.

use crate::model::{effective_tags, is_outline, scenarios};
use crate::render::{render_description, render_examples, render_steps};
use featsync_error::FeatsyncError;
use featsync_ids::{IssueKey, is_issue_key_tag, issue_keys_in};
use featsync_schema::{LocalFeature, LocalScenario};
use gherkin::{Feature, Rule, Scenario};
use std::collections::BTreeSet;

/// Build the local representation of a feature.
///
/// Every scenario must name its own test issue in its tags, and its
/// effective tags (feature, rule, scenario) must carry at least two issue
/// keys: the story and the test. Otherwise the whole feature is rejected.
pub fn adapt(feature: &Feature) -> Result<LocalFeature, FeatsyncError> {
    let scenarios = scenarios(feature)
        .map(|(rule, s)| adapt_scenario(feature, rule, s))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LocalFeature {
        description: render_description(feature),
        story_tags: issue_keys_in(&feature.tags),
        precondition: feature
            .background
            .as_ref()
            .map(|b| b.name.chars().skip(1).collect()),
        scenarios,
    })
}

fn adapt_scenario(
    feature: &Feature,
    rule: Option<&Rule>,
    scenario: &Scenario,
) -> Result<LocalScenario, FeatsyncError> {
    let line = scenario.position.line.to_string();
    let effective = effective_tags(feature, rule, scenario);
    let keys = issue_keys_in(&effective);
    if keys.len() < 2 {
        return Err(FeatsyncError::malformed_input(format!(
            "scenario '{}' carries {} issue key(s), a story and a test are required",
            scenario.name,
            keys.len()
        ))
        .with_context("line", line));
    }

    let scenario_id: IssueKey = issue_keys_in(&scenario.tags)
        .into_iter()
        .next()
        .ok_or_else(|| {
            FeatsyncError::malformed_input(format!(
                "scenario '{}' has no test issue key of its own",
                scenario.name
            ))
            .with_context("line", line)
        })?;

    let labels: BTreeSet<String> = effective
        .into_iter()
        .filter(|t| !is_issue_key_tag(t))
        .collect();

    let mut text = render_steps(&scenario.steps);
    let examples = if is_outline(scenario) {
        let rendered = render_examples(&scenario.examples);
        text.push_str("\n\n");
        text.push_str(&rendered);
        Some(rendered)
    } else {
        None
    };

    Ok(LocalScenario {
        scenario_id,
        labels,
        scenario_type: scenario.keyword.clone(),
        title: format!("{} - {}", feature.name, scenario.name),
        scenario: text,
        examples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use featsync_error::ErrorKind;

    const SRC: &str = "@PFWES-1 @web
Feature: Login
  Business rules apply.

  Background: @PFWES-5335
    Given the portal is up

  @PFWES-2 @smoke
  Scenario: valid user
    Given a
    When b

  @PFWES-3
  Scenario Outline: bad password
    Given user <name>
    Given nothing else

    Examples: wrong
      | name | error |
      | al   | x     |
";

    #[test]
    fn adapts_feature_level_fields() {
        let local = adapt(&parse(SRC).unwrap()).unwrap();
        assert_eq!(local.description, "Feature: Login\n\n\nBusiness rules apply.");
        assert_eq!(local.story_tags, vec![IssueKey::new("PFWES-1")]);
        assert_eq!(local.precondition.as_deref(), Some("PFWES-5335"));
        assert_eq!(local.scenarios.len(), 2);
    }

    #[test]
    fn adapts_plain_scenario() {
        let local = adapt(&parse(SRC).unwrap()).unwrap();
        let s = &local.scenarios[0];
        assert_eq!(s.scenario_id, IssueKey::new("PFWES-2"));
        assert_eq!(
            s.labels,
            ["smoke", "web"].iter().map(|s| s.to_string()).collect()
        );
        assert_eq!(s.scenario_type, "Scenario");
        assert_eq!(s.title, "Login - valid user");
        assert_eq!(s.scenario, "Given a\nWhen b");
        assert_eq!(s.examples, None);
    }

    #[test]
    fn outline_appends_examples_after_blank_line() {
        let local = adapt(&parse(SRC).unwrap()).unwrap();
        let s = &local.scenarios[1];
        assert_eq!(s.scenario_type, "Scenario Outline");
        let examples = "Examples: wrong\n | name | error |\n | al   | x     |\n";
        assert_eq!(s.examples.as_deref(), Some(examples));
        assert_eq!(
            s.scenario,
            format!("Given user <name>\nAnd nothing else\n\n{examples}")
        );
    }

    #[test]
    fn scenario_without_story_key_is_malformed() {
        let src = "Feature: F\n  @PFWES-2\n  Scenario: s\n    Given a\n";
        let err = adapt(&parse(src).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn scenario_without_own_key_is_malformed() {
        let src = "@PFWES-1 @PFWES-9\nFeature: F\n  @smoke\n  Scenario: s\n    Given a\n";
        let err = adapt(&parse(src).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.message().contains("of its own"));
    }

    #[test]
    fn no_background_means_no_precondition() {
        let src = "@PFWES-1\nFeature: F\n  @PFWES-2\n  Scenario: s\n    Given a\n";
        let local = adapt(&parse(src).unwrap()).unwrap();
        assert_eq!(local.precondition, None);
        assert!(local.scenarios[0].labels.is_empty());
    }

    #[test]
    fn rule_scenarios_are_flattened_with_rule_tags() {
        let src = "@PFWES-1
Feature: Payments

  @PFWES-2
  Scenario: plain
    Given a

  @limits
  Rule: daily limit

    @PFWES-3
    Scenario: under the limit
      Given b
";
        let local = adapt(&parse(src).unwrap()).unwrap();
        assert_eq!(local.scenarios.len(), 2);
        let ruled = &local.scenarios[1];
        assert_eq!(ruled.scenario_id, IssueKey::new("PFWES-3"));
        assert_eq!(ruled.title, "Payments - under the limit");
        assert!(ruled.labels.contains("limits"));
    }
}
