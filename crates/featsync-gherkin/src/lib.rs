//! Gherkin feature files for featsync.
//!
//! [`parse`] reads text into a [`gherkin::Feature`], [`adapt`] flattens it
//! into the [`LocalFeature`] the reconciliation engine compares, and
//! [`feature_files`] finds the files of a repository.

pub mod adapter;
pub mod model;
pub mod render;
pub mod scan;
pub mod table;

pub use adapter::adapt;
pub use gherkin::{Background, Examples, Feature, Rule, Scenario, Step, Table};
pub use model::{description_lines, effective_tags, is_outline, scenarios};
pub use render::{
    render_description, render_examples, render_rows, render_steps, render_table, step_keywords,
};
pub use scan::feature_files;
pub use table::table_to_map;

use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use featsync_schema::LocalFeature;
use gherkin::GherkinEnv;
use std::error::Error as _;
use std::path::Path;

/// Parse feature text. `# language:` headers select the keyword set.
pub fn parse(source: &str) -> Result<Feature, FeatsyncError> {
    // The grammar wants every line terminated.
    let owned;
    let source = if source.ends_with('\n') {
        source
    } else {
        owned = format!("{source}\n");
        owned.as_str()
    };

    Feature::parse(source, GherkinEnv::default()).map_err(|e| {
        let mut message = e.to_string();
        let mut cause = e.source();
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        FeatsyncError::malformed_input(message)
    })
}

/// Read and parse one feature file. Syntax errors are malformed input.
pub fn read_feature(path: &Path) -> Result<Feature> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read feature file {}", path.display()))?;
    parse(&source).map_err(|e| e.with_context("file", path.display().to_string()).into())
}

/// Read, parse and adapt one feature file.
pub fn load_local_feature(path: &Path) -> Result<LocalFeature> {
    let feature = read_feature(path)?;
    adapt(&feature)
        .map_err(|e| e.with_context("file", path.display().to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use featsync_error::{ErrorKind, kind_of};
    use featsync_ids::IssueKey;

    #[test]
    fn load_local_feature_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("login.feature");
        std::fs::write(
            &path,
            "@PFWES-1\nFeature: Login\n  @PFWES-2\n  Scenario: ok\n    Given a\n",
        )
        .unwrap();
        let local = load_local_feature(&path).unwrap();
        assert_eq!(local.scenarios[0].title, "Login - ok");
    }

    #[test]
    fn syntax_errors_are_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.feature");
        std::fs::write(&path, "Scenario: no feature\n").unwrap();
        let err = load_local_feature(&path).unwrap_err();
        assert_eq!(kind_of(&err), Some(ErrorKind::MalformedInput));
        assert!(err.to_string().contains("broken.feature"));
    }

    #[test]
    fn step_words_in_a_description_are_text() {
        let src = "@PFWES-1
Feature: Login
  Given the portal rules, users log in.
  When locked out they call support.

  @PFWES-2
  Scenario: ok
    Given a
";
        let feature = parse(src).unwrap();
        assert_eq!(
            description_lines(feature.description.as_deref()),
            vec![
                "Given the portal rules, users log in.",
                "When locked out they call support."
            ]
        );
        let local = adapt(&feature).unwrap();
        assert_eq!(local.scenarios[0].scenario, "Given a");
    }

    #[test]
    fn language_header_selects_keywords() {
        let src = "# language: fr
@PFWES-1
Fonctionnalité: Connexion
  @PFWES-2
  Scénario: ok
    Soit a
";
        let feature = parse(src).unwrap();
        assert_eq!(feature.name, "Connexion");
        let local = adapt(&feature).unwrap();
        assert_eq!(local.story_tags, vec![IssueKey::new("PFWES-1")]);
        assert_eq!(local.scenarios[0].scenario_id, IssueKey::new("PFWES-2"));
        assert_eq!(local.scenarios[0].title, "Connexion - ok");
        assert_eq!(local.scenarios[0].scenario, "Soit a");
    }

    #[test]
    fn unterminated_last_line_parses() {
        let feature = parse("Feature: F\n  Scenario: s\n    Given a").unwrap();
        assert_eq!(feature.scenarios[0].steps[0].value, "a");
    }
}
