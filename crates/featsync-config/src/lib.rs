//! Configuration loading for featsync.
//!
//! Every field has a default so an empty file (or no file) is a valid
//! configuration. Credentials other than the username never live here; the
//! password comes from the command line or `FEATSYNC_PASSWORD`.

use anyhow::Context;
use featsync_error::FeatsyncError;
use featsync_logging::LoggingConfig;
use featsync_schema::FieldMapping;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration format types supported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Main featsync configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatsyncConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub fields: FieldIds,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the tracker lives and who talks to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Project key used for creates and exports (`PFWES`).
    #[serde(default)]
    pub project: Option<String>,
    /// Link type joining a test to the story it covers.
    #[serde(default = "default_link_type")]
    pub link_type: String,
}

fn default_link_type() -> String {
    "Tests".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            project: None,
            link_type: default_link_type(),
        }
    }
}

/// Custom field ids of the tracker instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldIds {
    /// Test kind select (`Cucumber`, `Manual`, `Generic`).
    pub test_kind: String,
    /// Scenario keyword select (`Scenario`, `Scenario Outline`).
    pub scenario_type: String,
    /// Cucumber scenario text.
    pub scenario: String,
    /// Steps of a manual test (`{"steps": [{"step": ...}]}`).
    pub manual_steps: String,
    pub story_epic: String,
    pub story_role: String,
    pub story_action: String,
    pub story_benefit: String,
    pub epic_name: String,
    /// Test plans a test execution belongs to.
    pub test_plan: String,
}

impl Default for FieldIds {
    fn default() -> Self {
        Self {
            test_kind: "customfield_10202".to_string(),
            scenario_type: "customfield_10203".to_string(),
            scenario: "customfield_10204".to_string(),
            manual_steps: "customfield_10206".to_string(),
            story_epic: "customfield_10002".to_string(),
            story_role: "customfield_10503".to_string(),
            story_action: "customfield_10504".to_string(),
            story_benefit: "customfield_10505".to_string(),
            epic_name: "customfield_10004".to_string(),
            test_plan: "customfield_10228".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Relative paths resolve against the home directory.
    pub output_dir: PathBuf,
    /// Tag fragment marking the user story a feature documents.
    pub user_story_tag: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("featsync-reports"),
            user_story_tag: None,
        }
    }
}

impl FeatsyncConfig {
    /// Field mapping used by the reconciliation engine.
    pub fn field_mapping(&self) -> FieldMapping {
        FieldMapping::with_custom_fields(&self.fields.scenario_type, &self.fields.scenario)
    }

    /// Tracker base URL, or a config error naming the flag to set.
    pub fn tracker_url(&self) -> anyhow::Result<&str> {
        self.tracker
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| FeatsyncError::config("tracker url is not set (use --url)").into())
    }

    pub fn tracker_username(&self) -> anyhow::Result<&str> {
        self.tracker
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| FeatsyncError::config("tracker username is not set (use -u)").into())
    }
}

/// Load configuration from a file; the extension picks JSON or YAML.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<FeatsyncConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;

    let parsed = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&contents).map_err(|e| {
            FeatsyncError::config(format!(
                "invalid JSON config at line {} column {}: {e}",
                e.line(),
                e.column()
            ))
        }),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)
            .map_err(|e| FeatsyncError::config(format!("invalid YAML config: {e}"))),
    };
    parsed.with_context(|| format!("load config {}", path.display()))
}

/// Load the file when given, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<FeatsyncConfig> {
    match path {
        Some(p) => load_config(p),
        None => Ok(FeatsyncConfig::default()),
    }
}

/// Save configuration to a file
pub fn save_config(config: &FeatsyncConfig, path: impl Into<PathBuf>) -> anyhow::Result<()> {
    let path = path.into();
    let contents = match ConfigFormat::from_path(&path) {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("serialize JSON config")?
        }
        ConfigFormat::Yaml => serde_yaml::to_string(config).context("serialize YAML config")?,
    };

    std::fs::write(&path, contents).with_context(|| format!("write config {}", path.display()))?;
    Ok(())
}
