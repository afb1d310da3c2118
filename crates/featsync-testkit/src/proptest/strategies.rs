//! Proptest strategies for featsync property-based testing

use featsync_ids::IssueKey;
use featsync_schema::LocalScenario;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for generating valid issue keys (`ABC-12`)
pub fn strategy_issue_key() -> impl Strategy<Value = IssueKey> {
    ("[A-Z]{3,6}", 1u32..100_000).prop_map(|(project, n)| IssueKey::new(format!("{project}-{n}")))
}

/// Strategy for plain tags that never look like issue keys
pub fn strategy_label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

pub fn strategy_label_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(strategy_label(), 0..6)
}

/// Strategy for one step line body, without keyword
pub fn strategy_step_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,40}"
}

/// Strategy for a scenario as the adapter would produce it
pub fn strategy_local_scenario() -> impl Strategy<Value = LocalScenario> {
    (
        strategy_issue_key(),
        strategy_label_set(),
        prop_oneof![Just("Scenario"), Just("Scenario Outline")],
        "[A-Za-z ]{1,30}",
        prop::collection::vec(strategy_step_text(), 1..5),
    )
        .prop_map(|(scenario_id, labels, kind, title, steps)| LocalScenario {
            scenario_id,
            labels,
            scenario_type: kind.to_string(),
            title,
            scenario: steps
                .iter()
                .map(|s| format!("Given {s}"))
                .collect::<Vec<_>>()
                .join("\n"),
            examples: None,
        })
}
