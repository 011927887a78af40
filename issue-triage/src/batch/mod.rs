//! Bounded-concurrency batch execution.
//!
//! The harness runs one pipeline over many issues with a fixed pool of
//! workers. A producer feeds `(index, issue)` pairs through a queue holding
//! at most one item per worker; each worker builds a fresh [`Context`] per
//! item and reports `(index, issue, outcome)` on a results channel. Output is
//! reassembled by index, so it always matches input order.
//!
//! Bulk runs never write: pipelines built through [`BatchHarness::build`] get
//! their dependencies forced into dry-run mode.

mod error;

pub use error::BatchError;

use crate::issue::Issue;
use crate::pipeline::{Context, Pipeline, TriageResult};
use crate::registry::{Dependencies, Registry, RegistryError};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one batch item.
#[derive(Debug)]
pub struct BatchItem {
    /// Position of the issue in the input.
    pub index: usize,
    /// The issue snapshot.
    pub issue: Issue,
    /// The accumulated result, or why the run failed.
    pub outcome: Result<TriageResult, BatchError>,
}

impl BatchItem {
    /// Returns the result if the run succeeded.
    pub fn result(&self) -> Option<&TriageResult> {
        self.outcome.as_ref().ok()
    }
}

type WorkQueue = Arc<Mutex<mpsc::Receiver<(usize, Issue)>>>;

/// Runs a pipeline over many issues in parallel.
#[derive(Debug, Clone)]
pub struct BatchHarness {
    pipeline: Arc<Pipeline>,
    workers: usize,
}

impl BatchHarness {
    /// Creates a harness running `pipeline` with `workers` workers.
    ///
    /// A worker count of zero is treated as one.
    pub fn new(pipeline: Pipeline, workers: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: workers.max(1),
        }
    }

    /// Builds the named steps with dry-run forced on, whatever `deps` says.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the pipeline cannot be built.
    pub fn build<S: AsRef<str>>(
        registry: &Registry,
        names: &[S],
        deps: &Dependencies,
        workers: usize,
    ) -> Result<Self, RegistryError> {
        if !deps.dry_run {
            info!("Forcing dry-run for batch execution");
        }
        let deps = deps.clone().with_dry_run(true);
        let pipeline = registry.build_from_names(names, &deps)?;
        Ok(Self::new(pipeline, workers))
    }

    /// Returns the pipeline run for every item.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs the pipeline over every issue.
    ///
    /// The returned vector has one entry per input issue, in input order.
    /// A failed item never stops its siblings. Every item started runs to
    /// completion; `cancel` is handed to steps through their contexts.
    pub async fn run(&self, issues: Vec<Issue>, cancel: &CancellationToken) -> Vec<BatchItem> {
        let total = issues.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.workers.min(total);
        info!(items = total, workers, "Starting batch");

        let snapshots = issues.clone();
        let (work_tx, work_rx) = mpsc::channel::<(usize, Issue)>(workers);
        let (result_tx, mut result_rx) = mpsc::channel::<BatchItem>(workers);
        let queue: WorkQueue = Arc::new(Mutex::new(work_rx));

        let producer = tokio::spawn(async move {
            for (index, issue) in issues.into_iter().enumerate() {
                if work_tx.send((index, issue)).await.is_err() {
                    warn!(index, "Work queue closed early, no workers left");
                    break;
                }
            }
        });

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    queue.clone(),
                    result_tx.clone(),
                    self.pipeline.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        // Workers own the only remaining handles; when they are gone the
        // channels close.
        drop(queue);
        drop(result_tx);

        let coordinator = tokio::spawn(async move {
            let mut lost_workers = 0;
            for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
                match joined {
                    Ok(processed) => debug!(worker, processed, "Batch worker joined"),
                    Err(e) => {
                        error!(worker, error = %e, "Batch worker terminated abnormally");
                        lost_workers += 1;
                    }
                }
            }
            lost_workers
        });

        let mut slots: Vec<Option<BatchItem>> = (0..total).map(|_| None).collect();
        while let Some(item) = result_rx.recv().await {
            let index = item.index;
            slots[index] = Some(item);
        }

        if let Err(e) = producer.await {
            error!(error = %e, "Batch producer terminated abnormally");
        }
        match coordinator.await {
            Ok(0) => {}
            Ok(lost_workers) => warn!(lost_workers, "Some batch workers did not finish"),
            Err(e) => error!(error = %e, "Batch coordinator terminated abnormally"),
        }

        let items: Vec<BatchItem> = slots
            .into_iter()
            .zip(snapshots)
            .enumerate()
            .map(|(index, (slot, issue))| {
                slot.unwrap_or_else(|| {
                    error!(index, issue = %issue.id, "No result reported for batch item");
                    BatchItem {
                        index,
                        issue,
                        outcome: Err(BatchError::WorkerLost),
                    }
                })
            })
            .collect();

        let failed = items.iter().filter(|i| i.outcome.is_err()).count();
        info!(items = total, failed, "Batch complete");
        items
    }
}

async fn run_worker(
    worker: usize,
    queue: WorkQueue,
    results: mpsc::Sender<BatchItem>,
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
) -> usize {
    let mut processed = 0;

    loop {
        let next = queue.lock().await.recv().await;
        let Some((index, issue)) = next else {
            break;
        };

        let mut ctx = Context::new(issue.clone(), cancel.child_token());
        let outcome = match pipeline.run(&mut ctx).await {
            Ok(_) => Ok(ctx.into_result()),
            Err(e) => {
                warn!(worker, issue = %issue.id, error = %e, "Batch item failed");
                Err(BatchError::from(e))
            }
        };
        processed += 1;

        if results
            .send(BatchItem {
                index,
                issue,
                outcome,
            })
            .await
            .is_err()
        {
            break;
        }
    }

    processed
}
