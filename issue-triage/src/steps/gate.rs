//! Early exit for issues that need no triage.

use crate::pipeline::{Context, Step, StepOutcome};
use async_trait::async_trait;

/// Skips closed issues, bot-authored issues and issues carrying a skip label.
#[derive(Debug, Clone, Default)]
pub struct GateStep {
    skip_labels: Vec<String>,
}

impl GateStep {
    /// Creates a gate honouring `skip_labels`.
    pub fn new(skip_labels: Vec<String>) -> Self {
        Self { skip_labels }
    }
}

#[async_trait]
impl Step for GateStep {
    fn name(&self) -> &str {
        "gate"
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        let issue = ctx.issue();

        if !issue.is_open() {
            return StepOutcome::skip("issue is closed");
        }

        if issue.author.ends_with("[bot]") {
            return StepOutcome::skip(format!("opened by bot account '{}'", issue.author));
        }

        if let Some(label) = self.skip_labels.iter().find(|l| issue.has_label(l)) {
            return StepOutcome::skip(format!("carries skip label '{label}'"));
        }

        StepOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Issue, IssueId, IssueState};
    use tokio_util::sync::CancellationToken;

    fn run_gate(issue: Issue) -> StepOutcome {
        let gate = GateStep::new(vec!["wontfix".to_string()]);
        let mut ctx = Context::new(issue, CancellationToken::new());
        futures::executor::block_on(gate.run(&mut ctx))
    }

    fn issue() -> Issue {
        Issue::new(IssueId::new("acme", "widgets", 1), "Crash", "hana")
    }

    #[test]
    fn lets_open_issues_through() {
        assert!(matches!(run_gate(issue()), StepOutcome::Continue));
    }

    #[test]
    fn skips_closed_issues() {
        let mut closed = issue();
        closed.state = IssueState::Closed;
        assert!(matches!(run_gate(closed), StepOutcome::Skip { reason } if reason == "issue is closed"));
    }

    #[test]
    fn skips_bots() {
        let mut bot = issue();
        bot.author = "dependabot[bot]".to_string();
        assert!(matches!(run_gate(bot), StepOutcome::Skip { .. }));
    }

    #[test]
    fn skips_configured_labels() {
        let mut labelled = issue();
        labelled.labels = vec!["WontFix".to_string()];
        assert!(matches!(
            run_gate(labelled),
            StepOutcome::Skip { reason } if reason == "carries skip label 'wontfix'"
        ));
    }
}
