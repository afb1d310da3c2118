//! Output layout for featsync reports.
//!
//! A report run writes into one destination folder:
//!
//! ```text
//! <dest>/<plan>-report.xlsx
//! <dest>/<plan>/<execution>/<test>/<evidence file>
//! <dest>/<execution>-report.xlsx          (single execution report)
//! <dest>/<execution>/<test>/<evidence file>
//! ```
//!
//! Evidence links in the workbooks are relative to `<dest>`, so the folder
//! can be moved or zipped as a whole.

use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use featsync_ids::IssueKey;
use std::path::{Path, PathBuf};

/// Suffix of every generated workbook.
pub const REPORT_SUFFIX: &str = "-report.xlsx";

/// Default file name of the feature documentation.
pub const FILE_FEATURE_DOC: &str = "features.docx";

/// Default file name of a scenario evidence document.
pub const FILE_EVIDENCE_DOC: &str = "evidence.docx";

/// `dest` as is when absolute, otherwise under `home`.
pub fn resolve_against(home: &Path, dest: &Path) -> PathBuf {
    if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        home.join(dest)
    }
}

/// `dest` resolved against the user's home directory.
pub fn resolve_destination(dest: &Path) -> Result<PathBuf> {
    if dest.is_absolute() {
        return Ok(dest.to_path_buf());
    }
    let home = dirs::home_dir()
        .ok_or_else(|| FeatsyncError::config("could not determine the home directory"))?;
    Ok(resolve_against(&home, dest))
}

/// Empty folder at `dest`, removing whatever was there before.
pub fn prepare_folder(dest: &Path) -> Result<PathBuf> {
    let folder = resolve_destination(dest)?;
    recreate(&folder)?;
    Ok(folder)
}

/// Remove `folder` if present and create it again, empty.
pub fn recreate(folder: &Path) -> Result<()> {
    if folder.exists() {
        tracing::debug!(folder = %folder.display(), "folder exists, clearing it");
        std::fs::remove_dir_all(folder)
            .with_context(|| format!("clear {}", folder.display()))?;
    }
    std::fs::create_dir_all(folder).with_context(|| format!("create {}", folder.display()))
}

/// Paths of one report destination.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub root: PathBuf,
}

impl ReportPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<key>-report.xlsx`
    pub fn workbook(&self, key: &IssueKey) -> PathBuf {
        self.root.join(format!("{key}{REPORT_SUFFIX}"))
    }

    /// Absolute folder for a path relative to the root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Folder receiving the evidences of `test` run in `execution_dir`.
    pub fn evidence_dir(&self, execution_dir: &str, test: &IssueKey) -> PathBuf {
        self.resolve(execution_dir).join(test.as_str())
    }
}

/// Evidence folder of an execution, relative to the report root:
/// `<plan>/<execution>` inside a plan workbook, `<execution>` on its own.
pub fn execution_dir(plan: Option<&IssueKey>, execution: &IssueKey) -> String {
    match plan {
        Some(plan) => format!("{plan}/{execution}"),
        None => execution.to_string(),
    }
}

/// Link target written in a workbook for one evidence file.
pub fn evidence_link(execution_dir: &str, test: &IssueKey, file_name: &str) -> String {
    format!("{execution_dir}/{test}/{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> IssueKey {
        IssueKey::new(s)
    }

    #[test]
    fn relative_destinations_live_under_home() {
        let home = Path::new("/home/qa");
        assert_eq!(
            resolve_against(home, Path::new("reports/r1")),
            PathBuf::from("/home/qa/reports/r1")
        );
        assert_eq!(
            resolve_against(home, Path::new("/srv/reports")),
            PathBuf::from("/srv/reports")
        );
    }

    #[test]
    fn prepare_folder_clears_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir_all(dest.join("old")).unwrap();
        std::fs::write(dest.join("old/stale.xlsx"), "x").unwrap();

        let folder = prepare_folder(&dest).unwrap();

        assert_eq!(folder, dest);
        assert!(folder.is_dir());
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 0);
    }

    #[test]
    fn report_paths_are_stable() {
        let paths = ReportPaths::new("/tmp/rep");
        assert_eq!(
            paths.workbook(&key("PFWES-40")),
            PathBuf::from("/tmp/rep/PFWES-40-report.xlsx")
        );
        let exec = execution_dir(Some(&key("PFWES-40")), &key("PFWES-50"));
        assert_eq!(exec, "PFWES-40/PFWES-50");
        assert_eq!(
            paths.evidence_dir(&exec, &key("PFWES-2")),
            PathBuf::from("/tmp/rep/PFWES-40/PFWES-50/PFWES-2")
        );
        assert_eq!(
            evidence_link(&exec, &key("PFWES-2"), "shot.png"),
            "PFWES-40/PFWES-50/PFWES-2/shot.png"
        );
        assert_eq!(execution_dir(None, &key("PFWES-50")), "PFWES-50");
    }

    proptest! {
        #[test]
        fn evidence_link_matches_evidence_dir(
            plan in "[A-Z]{3,6}-[0-9]{1,4}",
            exec in "[A-Z]{3,6}-[0-9]{1,4}",
            test in "[A-Z]{3,6}-[0-9]{1,4}",
            file in "[a-z]{1,8}\\.png",
        ) {
            let paths = ReportPaths::new("/r");
            let dir = execution_dir(Some(&key(&plan)), &key(&exec));
            let link = evidence_link(&dir, &key(&test), &file);
            prop_assert_eq!(
                paths.resolve(&link),
                paths.evidence_dir(&dir, &key(&test)).join(&file)
            );
        }
    }
}
