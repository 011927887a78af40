//! Runner configuration.

use std::path::{Path, PathBuf};

/// Default location of the triage configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "triage.toml";

/// Configuration for a triage run.
///
/// Values set here override the ones in the triage configuration file.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// GitHub token used for API calls.
    token: String,
    /// Path to the triage configuration file.
    config_path: PathBuf,
    /// Whether to record conclusions without writing to the tracker.
    dry_run: bool,
    /// Overrides the configured worker count.
    concurrency: Option<usize>,
    /// Overrides the configured step list.
    steps: Option<Vec<String>>,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(token: String, dry_run: bool) -> Self {
        Self {
            token,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            dry_run,
            concurrency: None,
            steps: None,
        }
    }

    /// Sets a custom triage config path.
    pub fn with_config_path(mut self, config_path: PathBuf) -> Self {
        self.config_path = config_path;
        self
    }

    /// Overrides the batch worker count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Overrides the step list.
    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Returns the configured GitHub token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the triage config file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the worker count override.
    pub fn concurrency(&self) -> Option<usize> {
        self.concurrency
    }

    /// Returns the step list override.
    pub fn steps(&self) -> Option<&[String]> {
        self.steps.as_deref()
    }
}
