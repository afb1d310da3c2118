//! Reconciliation of local feature files with remote test issues.
//!
//! [`Reconciler::compare`] diffs one scenario against the issue fetched for
//! it and returns the minimal [`ChangeSet`]. [`Reconciler::apply`] pushes that
//! changeset one field at a time; a failed field is recorded and the others
//! still go through. [`Reconciler::sync_files`] runs both over a set of
//! feature files and summarises the run.

mod apply;
mod compare;
mod run;

pub use apply::{ApplyReport, FieldOutcome, build_payload};
pub use compare::{linked_keys, remote_labels, remote_text};
pub use run::{FileError, RunSummary};

use featsync_schema::FieldMapping;

/// Link type used between a test and the stories it covers.
pub const DEFAULT_LINK_TYPE: &str = "Tests";

#[derive(Debug, Clone)]
pub struct Reconciler {
    mapping: FieldMapping,
    link_type: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(FieldMapping::default())
    }
}

impl Reconciler {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            link_type: DEFAULT_LINK_TYPE.to_string(),
        }
    }

    pub fn with_link_type(mut self, link_type: impl Into<String>) -> Self {
        self.link_type = link_type.into();
        self
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn link_type(&self) -> &str {
        &self.link_type
    }
}
