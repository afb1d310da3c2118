use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use featsync_config::{FeatsyncConfig, load_or_default};
use featsync_error::{FeatsyncError, is_fatal};
use featsync_gherkin::{read_feature, scenarios};
use featsync_ids::IssueKey;
use featsync_jira::JiraClient;
use featsync_logging::init as init_logging;
use featsync_output_layout::{FILE_FEATURE_DOC, resolve_destination};
use featsync_reconcile::{Reconciler, RunSummary};
use featsync_report::{
    EvidenceInputs, ReleaseReporter, ReportTarget, load_history, scenario_evidence,
    write_feature_document,
};
use featsync_xray::{XrayClient, execution_summary, read_evidence_map};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "featsync", version)]
#[command(
    about = "Keep Gherkin feature files and tracker tests in sync, and report on executions.",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    global: Global,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Global {
    /// Tracker base URL. Overrides the config file.
    #[arg(long, global = true)]
    url: Option<String>,
    /// Tracker user. Overrides the config file.
    #[arg(short, long, global = true)]
    username: Option<String>,
    /// Password or API token.
    #[arg(short, long, env = "FEATSYNC_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
    /// YAML or JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log to this file instead of stderr. The previous log is kept as `<stem>_back.<ext>`.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update the tracker tests described by a repository of feature files.
    Sync {
        /// Folder searched recursively for `.feature` files.
        #[arg(long)]
        dir: PathBuf,
        /// Compute the changes without applying them.
        #[arg(long)]
        check: bool,
    },

    /// Write execution workbooks with their evidences.
    Report {
        #[command(subcommand)]
        target: ReportCmd,
        /// Destination folder, emptied first. Relative paths live under the home directory.
        #[arg(long, global = true)]
        out: Option<PathBuf>,
    },

    /// Document every feature file of a repository.
    Doc {
        #[arg(long)]
        repository: PathBuf,
        #[arg(long, default_value = "Feature documentation")]
        title: String,
        /// Tag fragment marking user stories (`PFWES`).
        #[arg(long)]
        tag: Option<String>,
        /// Behave plain log appended as the last execution report.
        #[arg(long)]
        execution: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build the evidence document of one executed scenario.
    Evidence {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, requires = "scenario")]
        feature: Option<PathBuf>,
        /// Scenario name inside `--feature`.
        #[arg(long, requires = "feature")]
        scenario: Option<String>,
        /// Folder of screenshots (`*.png`) and failure messages (`*.txt`).
        #[arg(long)]
        png: Option<PathBuf>,
        /// JSON array of recorded HTTP exchanges.
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Import a Cucumber JSON report as a new execution of a test plan.
    Export {
        #[arg(long)]
        plan: IssueKey,
        #[arg(long)]
        report: PathBuf,
        /// Execution summary. Defaults to the date, end time and `--system`.
        #[arg(long)]
        summary: Option<String>,
        /// System information written in the default summary.
        #[arg(long, default_value = "")]
        system: String,
        /// JSON map of test key to evidence files to attach to the runs.
        #[arg(long)]
        evidences: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCmd {
    /// Every test plan of a release.
    Release { name: String },
    /// One test plan and all its executions.
    Plan { key: IssueKey },
    /// One or more executions, comma separated.
    Execution { keys: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "featsync failed");
            eprintln!("error: {e:#}");
            if is_fatal(&e) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli.global)?;
    init_logging(&config.logging)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.cmd {
        Command::Sync { dir, check } => {
            let tracker = jira(&config, cli.global.password.as_deref())?;
            let reconciler = Reconciler::new(config.field_mapping())
                .with_link_type(config.tracker.link_type.as_str());
            let summary = reconciler.sync_repository(&tracker, &dir, check)?;
            print_summary(&summary);
            Ok(if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Report { target, out } => {
            let target = match target {
                ReportCmd::Release { name } => ReportTarget::Release(name),
                ReportCmd::Plan { key } => ReportTarget::Plan(key),
                ReportCmd::Execution { keys } => ReportTarget::executions(&keys)?,
            };
            let xray = XrayClient::new(jira(&config, cli.global.password.as_deref())?);
            let out = out.unwrap_or_else(|| config.report.output_dir.clone());
            let written = ReleaseReporter::new(&xray, &config.fields).generate(&target, &out)?;
            print_written(&written);
            Ok(ExitCode::SUCCESS)
        }

        Command::Doc {
            repository,
            title,
            tag,
            execution,
            output,
        } => {
            let output = match output {
                Some(path) => path,
                None => resolve_destination(&config.report.output_dir)?.join(FILE_FEATURE_DOC),
            };
            let tag = tag.or_else(|| config.report.user_story_tag.clone());
            write_feature_document(
                &repository,
                &title,
                tag.as_deref(),
                execution.as_deref(),
                &output,
            )?;
            print_written(&[output]);
            Ok(ExitCode::SUCCESS)
        }

        Command::Evidence {
            output,
            feature,
            scenario,
            png,
            history,
        } => {
            let feature = feature.as_deref().map(read_feature).transpose()?;
            let scenario = match (&feature, &scenario) {
                (Some(feature), Some(name)) => {
                    let found = scenarios(feature)
                        .map(|(_, s)| s)
                        .find(|s| &s.name == name)
                        .ok_or_else(|| {
                            FeatsyncError::not_found(format!(
                                "no scenario '{name}' in feature '{}'",
                                feature.name
                            ))
                        })?;
                    Some((feature, found))
                }
                _ => None,
            };
            let history = history.as_deref().map(load_history).transpose()?;

            let doc = scenario_evidence(&EvidenceInputs {
                scenario,
                history: history.as_deref().unwrap_or_default(),
                png_dir: png.as_deref(),
            })?;
            create_parent(&output)?;
            doc.save(&output)?;
            print_written(&[output]);
            Ok(ExitCode::SUCCESS)
        }

        Command::Export {
            plan,
            report,
            summary,
            system,
            evidences,
        } => {
            let evidences = evidences.as_deref().map(read_evidence_map).transpose()?;
            let summary =
                summary.unwrap_or_else(|| execution_summary(&chrono::Local::now(), &system));
            let xray = XrayClient::new(jira(&config, cli.global.password.as_deref())?);

            let outcome = xray.import_execution_to_test_plan(&plan, &report, &summary)?;
            println!("execution {} added to {plan}", outcome.execution);
            if let Some(evidences) = evidences {
                let uploaded = xray.load_attachments(&outcome.execution, &evidences)?;
                let failed = uploaded.iter().filter(|r| !r.is_applied()).count();
                println!("{} evidence file(s) uploaded, {failed} rejected", uploaded.len());
                if failed > 0 {
                    return Ok(ExitCode::FAILURE);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Config file values with the command-line flags applied on top.
fn load_config(global: &Global) -> Result<FeatsyncConfig> {
    let mut config = load_or_default(global.config.as_deref())?;
    if let Some(url) = &global.url {
        config.tracker.url = Some(url.clone());
    }
    if let Some(username) = &global.username {
        config.tracker.username = Some(username.clone());
    }
    if let Some(file) = &global.log_file {
        config.logging.file = Some(file.clone());
    }
    config.logging = config.logging.verbose(global.verbose);
    Ok(config)
}

fn jira(config: &FeatsyncConfig, password: Option<&str>) -> Result<JiraClient> {
    let url = config.tracker_url()?;
    let username = config.tracker_username()?;
    let password = password.ok_or_else(|| {
        FeatsyncError::config("password is not set (use -p or FEATSYNC_PASSWORD)")
    })?;
    let client = JiraClient::new(url, username, password)?.with_fields(config.fields.clone());
    Ok(client)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let mode = if summary.check { "check" } else { "sync" };
    println!(
        "{mode}: {} file(s), {} scenario(s), {} changed, {} field(s) applied, {} failed",
        summary.files,
        summary.scenarios,
        summary.changed,
        summary.applied_fields,
        summary.failed_fields
    );
    for error in &summary.errors {
        println!("- skipped {}: {}", error.path.display(), error.message);
    }
}

fn print_written(paths: &[PathBuf]) {
    println!("wrote:");
    for path in paths {
        println!("- {}", path.display());
    }
}
