//! Report generators for featsync.
//!
//! [`ReleaseReporter`] writes the `.xlsx` workbooks of a release, a test plan
//! or a list of test executions from an [`ExecutionSource`]. The document
//! builders write `.docx` files: [`feature_document`] for a repository of
//! feature files (optionally followed by an [`ExecutionLog`] section) and
//! [`scenario_evidence`] for one executed scenario.
//!
//! [`ExecutionSource`]: featsync_ports::ExecutionSource

mod evidence;
mod feature_doc;
mod log;
mod release;

pub use evidence::{
    EvidenceInputs, FAILURE_HEADING, HttpExchange, PICTURE_WIDTH_CM, load_history,
    scenario_evidence,
};
pub use feature_doc::{add_feature, feature_document, write_feature_document};
pub use log::{
    ExecutionLog, LogLine, ScenarioResult, ScenarioStatus, add_execution_log, parse_plain_log,
};
pub use release::{ReleaseReporter, ReportTarget, SUMMARY_SHEET, TestLine};
