//! Data model shared by the featsync crates.
//!
//! Defines the local representation of feature files, the mapping from
//! logical fields to remote issue paths, and the changeset produced when a
//! local scenario is diffed against its remote test issue.

pub mod change;
pub mod feature;
pub mod field;

pub use change::{ChangeSet, ChangeValue, FieldChange, LabelDelta};
pub use feature::{LocalFeature, LocalScenario};
pub use field::{FieldMapping, LogicalField};
