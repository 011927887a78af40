//! Label suggestions from a language model.

use crate::collaborators::{IssueTracker, LlmClient};
use crate::issue::{eq_ignore_case, Issue};
use crate::pipeline::{Context, Step, StepOutcome};
use crate::retry::RetryConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest issue body included in the prompt, in characters.
const MAX_PROMPT_BODY: usize = 4000;

/// Asks the model which candidate labels fit the issue.
///
/// Only configured candidates the issue does not already carry are kept.
/// Model failures are recorded as diagnostics.
pub struct LabelStep {
    llm: Option<Arc<dyn LlmClient>>,
    candidates: Vec<String>,
    tracker: Option<Arc<dyn IssueTracker>>,
    retry: RetryConfig,
}

impl LabelStep {
    /// Creates the step. `tracker` is `None` in dry runs.
    pub fn new(
        llm: Option<Arc<dyn LlmClient>>,
        candidates: Vec<String>,
        tracker: Option<Arc<dyn IssueTracker>>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            llm,
            candidates,
            tracker,
            retry,
        }
    }
}

fn build_prompt(issue: &Issue, candidates: &[String]) -> String {
    let body: String = issue.body.chars().take(MAX_PROMPT_BODY).collect();
    format!(
        "Pick the labels that apply to this GitHub issue.\n\
         Answer with a comma-separated list chosen only from: {}.\n\
         Answer \"none\" if nothing applies.\n\n\
         Title: {}\n\n{}",
        candidates.join(", "),
        issue.title,
        body
    )
}

/// Extracts known candidate labels from a model reply.
///
/// Matching ignores case and surrounding quotes or list markers; the
/// candidate's own spelling is returned.
pub fn parse_labels(reply: &str, candidates: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for token in reply.split([',', '\n']) {
        let token = token.trim().trim_matches(|c: char| {
            c == '"' || c == '\'' || c == '`' || c == '-' || c == '*' || c.is_whitespace()
        });
        if let Some(candidate) = candidates.iter().find(|c| eq_ignore_case(c, token)) {
            if !labels.contains(candidate) {
                labels.push(candidate.clone());
            }
        }
    }
    labels
}

#[async_trait]
impl Step for LabelStep {
    fn name(&self) -> &str {
        "labels"
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        let Some(llm) = &self.llm else {
            debug!("No language model configured, skipping label suggestions");
            return StepOutcome::Continue;
        };
        if self.candidates.is_empty() {
            return StepOutcome::Continue;
        }

        let issue = ctx.issue().clone();
        let cancel = ctx.cancellation().clone();
        let prompt = build_prompt(&issue, &self.candidates);

        let reply = match self
            .retry
            .run("suggest labels", &cancel, || llm.complete(&prompt))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(issue = %issue.id, error = %e, "Label suggestion failed");
                ctx.result_mut().record_error(format!("labels: {e}"));
                return StepOutcome::Continue;
            }
        };

        let labels: Vec<String> = parse_labels(&reply, &self.candidates)
            .into_iter()
            .filter(|l| !issue.has_label(l))
            .collect();
        debug!(issue = %issue.id, ?labels, "Suggested labels");
        if labels.is_empty() {
            return StepOutcome::Continue;
        }
        ctx.result_mut().suggest_labels(labels.iter().cloned());

        if let Some(tracker) = &self.tracker {
            if let Err(e) = self
                .retry
                .run("apply labels", &cancel, || {
                    tracker.add_labels(&issue.id, &labels, &cancel)
                })
                .await
            {
                warn!(issue = %issue.id, error = %e, "Could not apply labels");
                ctx.result_mut().record_error(format!("labels: {e}"));
            }
        }

        StepOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueId;
    use crate::steps::fakes::{fast_retry, FakeLlm, FakeTracker};
    use tokio_util::sync::CancellationToken;

    fn candidates() -> Vec<String> {
        vec!["bug".to_string(), "docs".to_string(), "UI".to_string()]
    }

    fn context() -> Context {
        let mut issue = Issue::new(IssueId::new("acme", "widgets", 3), "Button misaligned", "lee");
        issue.labels = vec!["bug".to_string()];
        Context::new(issue, CancellationToken::new())
    }

    #[test]
    fn parses_messy_replies() {
        let reply = "- `ui`\n* Bug, \"enhancement\", docs, bug";
        assert_eq!(parse_labels(reply, &candidates()), vec!["UI", "bug", "docs"]);
        assert!(parse_labels("none", &candidates()).is_empty());
    }

    #[tokio::test]
    async fn suggests_new_candidates_and_applies_them() {
        let llm = Arc::new(FakeLlm::replying("bug, ui"));
        let tracker = Arc::new(FakeTracker::default());
        let step = LabelStep::new(
            Some(llm.clone()),
            candidates(),
            Some(tracker.clone()),
            fast_retry(),
        );
        let mut ctx = context();

        assert!(matches!(step.run(&mut ctx).await, StepOutcome::Continue));

        assert_eq!(ctx.result().suggested_labels, vec!["UI"]);
        assert_eq!(tracker.calls(), vec!["labels acme/widgets#3 UI".to_string()]);
        assert!(llm.prompts.lock().unwrap()[0].contains("bug, docs, UI"));
    }

    #[tokio::test]
    async fn model_failure_is_not_fatal() {
        let step = LabelStep::new(
            Some(Arc::new(FakeLlm::failing(400))),
            candidates(),
            None,
            fast_retry(),
        );
        let mut ctx = context();

        assert!(matches!(step.run(&mut ctx).await, StepOutcome::Continue));
        assert!(ctx.result().suggested_labels.is_empty());
        assert_eq!(ctx.result().errors.len(), 1);
    }

    #[tokio::test]
    async fn without_model_does_nothing() {
        let step = LabelStep::new(None, candidates(), None, fast_retry());
        let mut ctx = context();

        assert!(matches!(step.run(&mut ctx).await, StepOutcome::Continue));
        assert!(ctx.result().errors.is_empty());
    }
}
