//! Project check harness.
//!
//! Checks that a station project tree is deployable: the Dockerfile and
//! compose file parse, scripts are executable and syntactically valid, the
//! documentation exists, and the runtime directories are writable. Nothing
//! here exercises the API itself.
//!
//! # Example
//!
//! ```no_run
//! use aprs_pi::checks::{CheckContext, CheckSuite};
//! use aprs_pi::config::ChecksConfig;
//!
//! # async fn example() {
//! let ctx = CheckContext::new(".", ChecksConfig::default());
//! let report = CheckSuite::standard().run(&ctx).await;
//! println!("{report}");
//! assert!(report.success());
//! # }
//! ```

mod docker;
mod files;
mod scripts;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ChecksConfig;
use crate::error::{Error, Result};

pub use docker::{DockerBuild, DockerComposeSyntax, DockerfileSyntax, EnvironmentVariables};
pub use files::{ConfigurationFiles, Documentation, ReadmeLinks, WebInterface, WritableDirectory};
pub use scripts::{HealthCheckScript, PythonSyntax, ScriptPermissions, ScriptSyntax};

/// The result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckOutcome {
    /// Everything the check looks at is in order.
    Passed,
    /// At least one problem was found.
    Failed {
        /// What is wrong.
        message: String,
    },
    /// The check could not run here, e.g. a tool is not installed.
    Skipped {
        /// Why it did not run.
        reason: String,
    },
}

impl CheckOutcome {
    /// A failure with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// A skip with a reason.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Pass if `problems` is empty, otherwise fail listing them all.
    #[must_use]
    pub fn from_problems(problems: Vec<String>) -> Self {
        if problems.is_empty() {
            Self::Passed
        } else {
            Self::failed(problems.join("; "))
        }
    }

    /// Map an external command error: a missing program skips, anything else fails.
    #[must_use]
    pub fn from_command_error(err: &Error) -> Self {
        match err {
            Error::CommandSpawn { program, .. } if err.is_missing_program() => {
                Self::skipped(format!("{program} not available"))
            }
            other => Self::failed(other.to_string()),
        }
    }

    /// Whether this outcome is a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed { .. } => "FAIL",
            Self::Skipped { .. } => "SKIP",
        }
    }
}

/// Where and how checks run.
#[derive(Debug, Clone)]
pub struct CheckContext {
    root: PathBuf,
    config: ChecksConfig,
}

impl CheckContext {
    /// A context for the project at `root`.
    pub fn new(root: impl Into<PathBuf>, config: ChecksConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A path relative to the project root.
    #[must_use]
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Check settings.
    #[must_use]
    pub fn config(&self) -> &ChecksConfig {
        &self.config
    }

    /// Timeout for long-running tools.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.config.command_timeout_secs)
    }

    /// Timeout for a single script syntax check.
    #[must_use]
    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.config.script_timeout_secs)
    }

    /// Timeout for the docker build dry run.
    #[must_use]
    pub fn docker_build_timeout(&self) -> Duration {
        Duration::from_secs(self.config.docker_build_timeout_secs)
    }

    /// Files in `scripts/` with the given extension, sorted by name.
    ///
    /// Empty when the directory does not exist.
    pub async fn scripts_with_extension(&self, extension: &str) -> Vec<PathBuf> {
        let Ok(mut entries) = tokio::fs::read_dir(self.path("scripts")).await else {
            return Vec::new();
        };

        let mut found = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file && path.extension().is_some_and(|ext| ext == extension) {
                found.push(path);
            }
        }
        found.sort();
        found
    }

    /// `path` relative to the root, for handing to a child run in the root.
    #[must_use]
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    /// Render `path` relative to the root for messages.
    #[must_use]
    pub fn display(&self, path: &Path) -> String {
        self.relative(path).display().to_string()
    }
}

/// A single project check.
#[async_trait]
pub trait ProjectCheck: Send + Sync + fmt::Debug {
    /// Stable identifier, used to select checks.
    fn name(&self) -> &'static str;

    /// One-line summary of what is checked.
    fn description(&self) -> &'static str;

    /// Run the check against the project in `ctx`.
    async fn run(&self, ctx: &CheckContext) -> CheckOutcome;
}

/// One check's name, summary and outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Check identifier.
    pub name: String,
    /// What was checked.
    pub description: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    /// Wall time spent.
    pub duration_ms: u64,
}

/// Results of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Per-check results in run order.
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// Number of passed checks.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Passed))
    }

    /// Number of failed checks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CheckOutcome::is_failure)
    }

    /// Number of skipped checks.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Skipped { .. }))
    }

    /// True when nothing failed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    /// Render the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The result for a check, by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.name == name)
    }

    fn count(&self, pred: impl Fn(&CheckOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            write!(f, "{}  {:<24}", result.outcome.label(), result.name)?;
            match &result.outcome {
                CheckOutcome::Passed => writeln!(f, "{}", result.description)?,
                CheckOutcome::Failed { message } => writeln!(f, "{message}")?,
                CheckOutcome::Skipped { reason } => writeln!(f, "{reason}")?,
            }
        }
        write!(
            f,
            "\n{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

/// An ordered set of checks.
#[derive(Debug, Default)]
pub struct CheckSuite {
    checks: Vec<Box<dyn ProjectCheck>>,
}

impl CheckSuite {
    /// An empty suite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every check, in the order they should run.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(DockerComposeSyntax)
            .with(DockerfileSyntax)
            .with(ScriptPermissions)
            .with(ScriptSyntax)
            .with(PythonSyntax)
            .with(ConfigurationFiles)
            .with(Documentation)
            .with(WebInterface)
            .with(EnvironmentVariables)
            .with(WritableDirectory::logs())
            .with(WritableDirectory::data())
            .with(ReadmeLinks)
            .with(HealthCheckScript)
            .with(DockerBuild)
    }

    /// Append a check.
    #[must_use]
    pub fn with(mut self, check: impl ProjectCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Keep only the named checks, preserving suite order.
    ///
    /// An empty `names` keeps everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCheck`] for a name no check carries.
    pub fn select(self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.checks.iter().any(|c| c.name() == n.as_str()))
        {
            return Err(Error::UnknownCheck(unknown.clone()));
        }
        Ok(Self {
            checks: self
                .checks
                .into_iter()
                .filter(|c| names.iter().any(|n| n == c.name()))
                .collect(),
        })
    }

    /// Names of the checks in this suite.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every check in order.
    pub async fn run(&self, ctx: &CheckContext) -> CheckReport {
        info!(root = %ctx.root().display(), checks = self.checks.len(), "running project checks");

        let mut report = CheckReport::default();
        for check in &self.checks {
            let started = Instant::now();
            let outcome = check.run(ctx).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &outcome {
                CheckOutcome::Passed => debug!(check = check.name(), duration_ms, "passed"),
                CheckOutcome::Failed { message } => {
                    warn!(check = check.name(), %message, "failed");
                }
                CheckOutcome::Skipped { reason } => {
                    info!(check = check.name(), %reason, "skipped");
                }
            }

            report.results.push(CheckResult {
                name: check.name().to_string(),
                description: check.description().to_string(),
                outcome,
                duration_ms,
            });
        }
        report
    }
}
