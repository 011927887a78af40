//! Step observation hooks.

use super::context::Context;
use super::step::{Step, StepOutcome};
use crate::issue::Issue;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Receives notifications around each step of a run.
pub trait StepObserver: Send + Sync {
    /// Called right before `step` runs.
    fn on_start(&self, step: &str, issue: &Issue);

    /// Called after `step` returned `outcome`.
    fn on_finish(&self, step: &str, issue: &Issue, outcome: &StepOutcome, elapsed: Duration);
}

/// Wraps a step, notifying an observer without touching the outcome.
pub struct ObservedStep {
    inner: Arc<dyn Step>,
    observer: Arc<dyn StepObserver>,
}

impl ObservedStep {
    /// Wraps `inner` so `observer` sees every invocation.
    pub fn new(inner: Arc<dyn Step>, observer: Arc<dyn StepObserver>) -> Self {
        Self { inner, observer }
    }
}

#[async_trait]
impl Step for ObservedStep {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        self.observer.on_start(self.inner.name(), ctx.issue());
        let started = Instant::now();
        let outcome = self.inner.run(ctx).await;
        self.observer
            .on_finish(self.inner.name(), ctx.issue(), &outcome, started.elapsed());
        outcome
    }
}

/// Observer that reports step progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_start(&self, step: &str, issue: &Issue) {
        debug!(issue = %issue.id, step, "Step started");
    }

    fn on_finish(&self, step: &str, issue: &Issue, outcome: &StepOutcome, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            StepOutcome::Continue => {
                debug!(issue = %issue.id, step, elapsed_ms, "Step finished");
            }
            StepOutcome::Skip { reason } => {
                info!(issue = %issue.id, step, elapsed_ms, reason = %reason, "Step skipped remaining work");
            }
            StepOutcome::Failed(error) => {
                warn!(issue = %issue.id, step, elapsed_ms, error = %error, "Step failed");
            }
        }
    }
}
