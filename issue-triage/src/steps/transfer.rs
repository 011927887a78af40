//! Rule-driven transfer to another repository.

use crate::collaborators::IssueTracker;
use crate::issue::eq_ignore_case;
use crate::pipeline::{Context, Step, StepOutcome};
use crate::retry::RetryConfig;
use crate::templates::CommentRenderer;
use crate::transfer::{RuleMatcher, TransferDecision};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Metadata key holding the new URL of a transferred issue.
pub const TRANSFERRED_URL_KEY: &str = "transfer.url";

/// Routes the issue to the repository chosen by the transfer rules.
///
/// Rules pointing at the issue's own repository are ignored. With a writable
/// tracker the issue gets an explanatory comment and is then moved.
pub struct TransferStep {
    matcher: RuleMatcher,
    renderer: CommentRenderer,
    tracker: Option<Arc<dyn IssueTracker>>,
    retry: RetryConfig,
}

impl TransferStep {
    /// Creates the step. `tracker` is `None` in dry runs.
    pub fn new(
        matcher: RuleMatcher,
        renderer: CommentRenderer,
        tracker: Option<Arc<dyn IssueTracker>>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            matcher,
            renderer,
            tracker,
            retry,
        }
    }
}

#[async_trait]
impl Step for TransferStep {
    fn name(&self) -> &str {
        "transfer"
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        let issue = ctx.issue().clone();
        let TransferDecision::Matched(matched) = self.matcher.evaluate(&issue) else {
            return StepOutcome::Continue;
        };

        if eq_ignore_case(&matched.target, &issue.id.repository()) {
            debug!(issue = %issue.id, rule = %matched.rule, "Rule targets current repository");
            return StepOutcome::Continue;
        }

        if !ctx
            .result_mut()
            .set_transfer(matched.target.clone(), 1.0, matched.reason.clone())
        {
            return StepOutcome::Continue;
        }
        info!(issue = %issue.id, target = %matched.target, rule = %matched.rule, "Selected transfer target");

        let Some(tracker) = &self.tracker else {
            return StepOutcome::Continue;
        };

        let comment = match self
            .renderer
            .render_transfer(&issue, &matched.target, &matched.reason)
        {
            Ok(comment) => comment,
            Err(e) => return StepOutcome::fail(e),
        };

        let cancel = ctx.cancellation().clone();
        if let Err(e) = self
            .retry
            .run("post transfer comment", &cancel, || {
                tracker.post_comment(&issue.id, &comment, &cancel)
            })
            .await
        {
            return StepOutcome::fail(e);
        }

        match self
            .retry
            .run("transfer issue", &cancel, || {
                tracker.transfer_issue(&issue.id, &matched.target, &cancel)
            })
            .await
        {
            Ok(url) => {
                info!(issue = %issue.id, %url, "Transferred issue");
                ctx.insert_meta(TRANSFERRED_URL_KEY, url);
                StepOutcome::Continue
            }
            Err(e) => StepOutcome::fail(e),
        }
    }
}
