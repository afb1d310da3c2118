use crate::{ApplyReport, Reconciler};
use anyhow::Result;
use featsync_error::{ErrorKind, kind_of};
use featsync_gherkin::{feature_files, load_local_feature};
use featsync_ports::IssueTracker;
use featsync_schema::{ChangeSet, LocalFeature, LocalScenario};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A feature file left out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// Totals of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub check: bool,
    pub files: usize,
    pub scenarios: usize,
    /// Scenarios whose remote test differed.
    pub changed: usize,
    pub applied_fields: usize,
    pub failed_fields: usize,
    pub errors: Vec<FileError>,
}

impl RunSummary {
    /// No file skipped and no field rejected.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.failed_fields == 0
    }

    fn record(&mut self, report: &ApplyReport) {
        self.applied_fields += report.applied();
        self.failed_fields += report.failed();
    }

    pub fn log(&self) {
        tracing::info!(
            check = self.check,
            files = self.files,
            scenarios = self.scenarios,
            changed = self.changed,
            applied = self.applied_fields,
            failed = self.failed_fields,
            "sync finished"
        );
        for error in &self.errors {
            tracing::warn!(file = %error.path.display(), "{}", error.message);
        }
    }
}

impl Reconciler {
    /// Fetch, diff and (unless `check`) apply one scenario.
    ///
    /// Fails when the remote issue can't be read or is not a test.
    pub fn sync_scenario<T>(
        &self,
        tracker: &T,
        feature: &LocalFeature,
        scenario: &LocalScenario,
        check: bool,
    ) -> Result<(ChangeSet, Option<ApplyReport>)>
    where
        T: IssueTracker + ?Sized,
    {
        let remote = tracker.fetch_test(&scenario.scenario_id)?;
        let changes = self.compare(feature, scenario, &remote);
        if changes.is_empty() {
            tracing::debug!(test = %scenario.scenario_id, "test up to date");
            return Ok((changes, None));
        }
        if check {
            for (path, change) in changes.iter() {
                tracing::info!(
                    test = %scenario.scenario_id,
                    field = %change.field,
                    path,
                    "would update"
                );
            }
            return Ok((changes, None));
        }
        let report = self.apply(tracker, &scenario.scenario_id, &changes);
        Ok((changes, Some(report)))
    }

    /// Sync every scenario of `files`.
    ///
    /// A file that can't be adapted is recorded and skipped; remote lookup
    /// failures end the run.
    pub fn sync_files<T>(&self, tracker: &T, files: &[PathBuf], check: bool) -> Result<RunSummary>
    where
        T: IssueTracker + ?Sized,
    {
        let mut summary = RunSummary {
            check,
            ..RunSummary::default()
        };
        for path in files {
            summary.files += 1;
            let feature = match load_local_feature(path) {
                Ok(feature) => feature,
                Err(e) if kind_of(&e) == Some(ErrorKind::MalformedInput) => {
                    tracing::warn!(file = %path.display(), error = %e, "feature file skipped");
                    summary.errors.push(FileError {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            tracing::info!(file = %path.display(), scenarios = feature.scenarios.len(), "syncing");

            for scenario in &feature.scenarios {
                summary.scenarios += 1;
                let (changes, report) = self.sync_scenario(tracker, &feature, scenario, check)?;
                if !changes.is_empty() {
                    summary.changed += 1;
                }
                if let Some(report) = report {
                    summary.record(&report);
                }
            }
        }
        summary.log();
        Ok(summary)
    }

    /// Sync every feature file under `root`.
    pub fn sync_repository<T>(&self, tracker: &T, root: &Path, check: bool) -> Result<RunSummary>
    where
        T: IssueTracker + ?Sized,
    {
        let files = feature_files(root)?;
        self.sync_files(tracker, &files, check)
    }
}
