//! Proptest strategies shared by featsync property tests.

pub mod strategies;

pub use strategies::{
    strategy_issue_key, strategy_label, strategy_label_set, strategy_local_scenario,
    strategy_step_text,
};
