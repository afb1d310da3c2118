//! Views over the parsed [`gherkin::Feature`].
//!
//! Tags come without the leading `@`. Scenarios written under a `Rule:`
//! live in [`Rule::scenarios`]; [`scenarios`] walks both levels in file
//! order.

use gherkin::{Feature, Rule, Scenario};
use std::collections::HashSet;

/// Every scenario of the feature with the rule it is written under.
pub fn scenarios(feature: &Feature) -> impl Iterator<Item = (Option<&Rule>, &Scenario)> {
    feature.scenarios.iter().map(|s| (None, s)).chain(
        feature
            .rules
            .iter()
            .flat_map(|rule| rule.scenarios.iter().map(move |s| (Some(rule), s))),
    )
}

/// Feature, rule and scenario tags in that order, without duplicates.
pub fn effective_tags(feature: &Feature, rule: Option<&Rule>, scenario: &Scenario) -> Vec<String> {
    let mut tags = feature.tags.clone();
    if let Some(rule) = rule {
        tags.extend(rule.tags.iter().cloned());
    }
    tags.extend(scenario.tags.iter().cloned());

    let mut seen = HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags
}

pub fn is_outline(scenario: &Scenario) -> bool {
    !scenario.examples.is_empty()
        || scenario.keyword.ends_with("Outline")
        || scenario.keyword.ends_with("Template")
}

/// Description text as trimmed lines, without leading or trailing blanks.
pub fn description_lines(description: Option<&str>) -> Vec<String> {
    let lines: Vec<String> = description
        .unwrap_or_default()
        .lines()
        .map(|l| l.trim().to_string())
        .collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    const RULES: &str = "@PFWES-1
Feature: Payments

  @PFWES-2
  Scenario: top level
    Given a

  @limits
  Rule: daily limit

    @PFWES-3 @limits
    Scenario: under the limit
      Given b
";

    #[test]
    fn walks_rule_scenarios_after_top_level_ones() {
        let feature = parse(RULES).unwrap();
        let names: Vec<_> = scenarios(&feature)
            .map(|(rule, s)| (rule.map(|r| r.name.as_str()), s.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![(None, "top level"), (Some("daily limit"), "under the limit")]
        );
    }

    #[test]
    fn rule_tags_are_inherited_once() {
        let feature = parse(RULES).unwrap();
        let (rule, scenario) = scenarios(&feature).nth(1).unwrap();
        assert_eq!(
            effective_tags(&feature, rule, scenario),
            vec!["PFWES-1", "limits", "PFWES-3"]
        );
    }

    #[test]
    fn description_lines_are_trimmed() {
        assert_eq!(
            description_lines(Some("\n   As a user.\n     I log in.\n\n")),
            vec!["As a user.", "I log in."]
        );
        assert!(description_lines(None).is_empty());
    }
}
