//! Orchestrates single-issue and repository-wide triage runs.

mod config;
mod error;

pub use config::{RunnerConfig, DEFAULT_CONFIG_PATH};
pub use error::RunnerError;

use crate::batch::{BatchHarness, BatchItem};
use crate::collaborators::{GithubTracker, IssueTracker};
use crate::config::TriageConfig;
use crate::duplicates::{resolve_duplicate_chains, ChainReport};
use crate::issue::{Issue, IssueId};
use crate::pipeline::{Context, RunOutcome, TracingObserver, TriageResult};
use crate::registry::{Dependencies, Registry};
use crate::summary::BatchSummary;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

/// Result of a repository-wide run.
#[derive(Debug)]
pub struct BatchReport {
    /// One entry per listed issue, in listing order.
    pub items: Vec<BatchItem>,
    /// Duplicate chains collapsed after the batch.
    pub chains: ChainReport,
    /// Aggregate counters.
    pub summary: BatchSummary,
}

/// Runs triage pipelines against a tracker.
pub struct Runner {
    config: RunnerConfig,
    triage: TriageConfig,
    registry: Registry,
    tracker: Arc<dyn IssueTracker>,
    deps: Dependencies,
}

impl Runner {
    /// Builds a runner talking to GitHub with the configured token.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub client cannot be built or the triage
    /// configuration fails to load.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let tracker = GithubTracker::from_token(config.token())?;
        Self::with_tracker(config, Arc::new(tracker))
    }

    /// Builds a runner over an existing tracker.
    ///
    /// # Errors
    ///
    /// Returns an error if the triage configuration fails to load or the
    /// overrides make it invalid.
    pub fn with_tracker(
        config: RunnerConfig,
        tracker: Arc<dyn IssueTracker>,
    ) -> Result<Self, RunnerError> {
        let mut triage = TriageConfig::load_or_default(config.config_path())?;
        if let Some(concurrency) = config.concurrency() {
            triage.concurrency = concurrency;
        }
        if let Some(steps) = config.steps() {
            triage.steps = steps.to_vec();
        }
        triage.validate(config.config_path())?;

        let registry = Registry::with_builtin_steps(&triage);
        let deps = Dependencies::default()
            .with_tracker(tracker.clone())
            .with_dry_run(config.dry_run());

        Ok(Self {
            config,
            triage,
            registry,
            tracker,
            deps,
        })
    }

    /// Replaces the injected collaborators, keeping the tracker and dry-run
    /// setting.
    pub fn with_dependencies(mut self, deps: Dependencies) -> Self {
        self.deps = deps
            .with_tracker(self.tracker.clone())
            .with_dry_run(self.config.dry_run());
        self
    }

    /// Returns the effective triage configuration.
    pub fn triage_config(&self) -> &TriageConfig {
        &self.triage
    }

    /// Runs the configured pipeline against one issue.
    ///
    /// Writes happen unless the runner is in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be fetched, the pipeline cannot
    /// be built, or a step fails.
    pub async fn triage_issue(
        &self,
        id: &IssueId,
        cancel: &CancellationToken,
    ) -> Result<TriageResult, RunnerError> {
        let span = info_span!("triage_issue", issue = %id, dry_run = self.config.dry_run());

        async {
            let pipeline = self
                .registry
                .build_from_names(&self.triage.steps, &self.deps)?
                .observed(Arc::new(TracingObserver));
            let issue = self.fetch(id, cancel).await?;

            let mut ctx = Context::new(issue, cancel.child_token());
            match pipeline.run(&mut ctx).await? {
                RunOutcome::Completed => info!("Triage completed"),
                RunOutcome::Skipped { step, reason } => {
                    info!(step = %step, reason = %reason, "Triage skipped");
                }
            }
            Ok::<_, RunnerError>(ctx.into_result())
        }
        .instrument(span)
        .await
    }

    /// Triages up to `limit` open issues of `org/repo` in parallel.
    ///
    /// Bulk runs never write to the tracker. Duplicate chains are collapsed
    /// once every item has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the issues cannot be listed or the pipeline cannot
    /// be built. Individual item failures are reported in the
    /// [`BatchReport`].
    pub async fn triage_repository(
        &self,
        org: &str,
        repo: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, RunnerError> {
        let span = info_span!("triage_repository", repository = %format!("{org}/{repo}"), limit);

        async {
            let harness = BatchHarness::build(
                &self.registry,
                &self.triage.steps,
                &self.deps,
                self.triage.concurrency,
            )?;

            let tracker = &self.tracker;
            let issues = self
                .triage
                .retry
                .run("list open issues", cancel, || {
                    tracker.list_open_issues(org, repo, limit)
                })
                .await?;
            info!(count = issues.len(), "Fetched open issues");

            let mut items = harness.run(issues, cancel).await;
            let chains = resolve_duplicate_chains(&mut items);
            let summary = BatchSummary::from_items(&items);
            info!(
                total = summary.total,
                triaged = summary.triaged,
                skipped = summary.skipped,
                failed = summary.failed,
                "Batch finished"
            );

            Ok::<_, RunnerError>(BatchReport {
                items,
                chains,
                summary,
            })
        }
        .instrument(span)
        .await
    }

    async fn fetch(
        &self,
        id: &IssueId,
        cancel: &CancellationToken,
    ) -> Result<Issue, RunnerError> {
        let tracker = &self.tracker;
        Ok(self
            .triage
            .retry
            .run("fetch issue", cancel, || tracker.fetch_issue(id))
            .await?)
    }
}
