//! Duplicate flagging from similarity matches.

use crate::collaborators::IssueTracker;
use crate::pipeline::{Context, Step, StepOutcome};
use crate::retry::RetryConfig;
use crate::templates::CommentRenderer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Marks the issue as a duplicate of its best similar match.
///
/// Runs after `similarity`. When the best score reaches the threshold, the
/// result is updated and, with a writable tracker, a comment and a label are
/// applied to the issue.
pub struct DuplicateStep {
    threshold: f32,
    label: String,
    renderer: CommentRenderer,
    tracker: Option<Arc<dyn IssueTracker>>,
    retry: RetryConfig,
}

impl DuplicateStep {
    /// Creates the step. `tracker` is `None` in dry runs.
    pub fn new(
        threshold: f32,
        label: impl Into<String>,
        renderer: CommentRenderer,
        tracker: Option<Arc<dyn IssueTracker>>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            threshold,
            label: label.into(),
            renderer,
            tracker,
            retry,
        }
    }
}

#[async_trait]
impl Step for DuplicateStep {
    fn name(&self) -> &str {
        "duplicate"
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        let issue = ctx.issue().clone();
        let Some(best) = ctx.result().best_match().cloned() else {
            return StepOutcome::Continue;
        };

        if best.score < self.threshold || best.id == issue.id {
            debug!(issue = %issue.id, score = best.score, "Best match below duplicate threshold");
            return StepOutcome::Continue;
        }

        if !ctx.result_mut().set_duplicate(best.id.clone(), best.score) {
            return StepOutcome::Continue;
        }
        info!(issue = %issue.id, target = %best.id, score = best.score, "Flagged duplicate");

        let Some(tracker) = &self.tracker else {
            return StepOutcome::Continue;
        };

        let comment = match self.renderer.render_duplicate(&issue, &best.id, best.score) {
            Ok(comment) => comment,
            Err(e) => return StepOutcome::fail(e),
        };

        let cancel = ctx.cancellation().clone();
        if let Err(e) = self
            .retry
            .run("post duplicate comment", &cancel, || {
                tracker.post_comment(&issue.id, &comment, &cancel)
            })
            .await
        {
            return StepOutcome::fail(e);
        }

        if !self.label.is_empty() {
            let labels = [self.label.clone()];
            if let Err(e) = self
                .retry
                .run("label duplicate", &cancel, || {
                    tracker.add_labels(&issue.id, &labels, &cancel)
                })
                .await
            {
                return StepOutcome::fail(e);
            }
        }

        StepOutcome::Continue
    }
}
