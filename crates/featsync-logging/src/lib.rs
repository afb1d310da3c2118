//! Logging configuration and subscriber setup for featsync.
//!
//! Library crates only emit through `tracing`; the binary calls [`init`] once
//! with a [`LoggingConfig`] built from the config file and CLI flags.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Log level for filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Check if this level lets messages at `level` through
    pub fn should_log(&self, level: LogLevel) -> bool {
        *self >= level
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Per-crate overrides, keyed by target (`featsync_jira`)
    #[serde(default)]
    pub component_levels: BTreeMap<String, LogLevel>,
    /// Write to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            component_levels: BTreeMap::new(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// `--verbose` raises the base level to debug, never lowers it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose && self.level < LogLevel::Debug {
            self.level = LogLevel::Debug;
        }
        self
    }

    pub fn effective_level(&self, component: Option<&str>) -> LogLevel {
        component
            .and_then(|c| self.component_levels.get(c).copied())
            .unwrap_or(self.level)
    }

    /// Filter directives in `EnvFilter` syntax: `info,featsync_jira=debug`.
    pub fn directives(&self) -> String {
        let mut parts = vec![self.level.as_str().to_string()];
        parts.extend(
            self.component_levels
                .iter()
                .map(|(target, level)| format!("{target}={}", level.as_str())),
        );
        parts.join(",")
    }

    /// `RUST_LOG` wins over the configured directives when it is set.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(env) if !env.trim().is_empty() => {
                EnvFilter::try_new(&env).with_context(|| format!("parse RUST_LOG '{env}'"))
            }
            _ => EnvFilter::try_new(self.directives())
                .with_context(|| format!("parse log directives '{}'", self.directives())),
        }
    }
}

/// Backup name for a log file: `test_log.log` becomes `test_log_back.log`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_back.{}", ext.to_string_lossy()),
        None => format!("{stem}_back"),
    };
    path.with_file_name(name)
}

/// Move last run's log aside, replacing any older backup.
///
/// Returns the backup path when a log was rotated.
pub fn rotate_log_file(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path(path);
    if backup.exists() {
        fs::remove_file(&backup).with_context(|| format!("remove {}", backup.display()))?;
    }
    fs::rename(path, &backup)
        .with_context(|| format!("rotate {} to {}", path.display(), backup.display()))?;
    Ok(Some(backup))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;

    let (writer, ansi) = match &config.file {
        Some(path) => {
            rotate_log_file(path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    macro_rules! install {
        ($b:expr) => {
            if config.timestamps {
                $b.try_init()
            } else {
                $b.without_time().try_init()
            }
        };
    }

    let installed = match config.format {
        LogFormat::Plain => install!(builder),
        LogFormat::Json => install!(builder.json()),
        LogFormat::Compact => install!(builder.compact()),
    };
    installed.map_err(|e| anyhow!("install log subscriber: {e}"))?;
    tracing::debug!(directives = %config.directives(), "logging ready");
    Ok(())
}
