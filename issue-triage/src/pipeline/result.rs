//! Triage result accumulator.

use crate::issue::{eq_ignore_case, IssueId, IssueState};
use serde::Serialize;

/// A previously filed issue that looks similar to the one being triaged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarIssue {
    /// Identity of the similar issue.
    pub id: IssueId,
    /// Title of the similar issue.
    pub title: String,
    /// Similarity score, higher is closer.
    pub score: f32,
    /// State of the similar issue.
    pub state: IssueState,
}

/// Conclusions accumulated by the steps of one run.
///
/// Fields are additive: a step should not replace a conclusion another step
/// already reached. The `set_*` helpers return `false` and leave the result
/// untouched when a conclusion is already present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriageResult {
    /// Whether the run stopped early on purpose.
    pub skipped: bool,
    /// Why the run stopped early.
    pub skip_reason: Option<String>,
    /// Similar issues, best match first.
    pub similar: Vec<SimilarIssue>,
    /// Whether the issue was judged a duplicate.
    pub duplicate: bool,
    /// Issue this one duplicates.
    pub duplicate_of: Option<IssueId>,
    /// Confidence of the duplicate verdict.
    pub duplicate_confidence: Option<f32>,
    /// Repository (`org/repo`) the issue should move to.
    pub transfer_target: Option<String>,
    /// Confidence of the transfer decision.
    pub transfer_confidence: Option<f32>,
    /// Human-readable explanation of the transfer decision.
    pub transfer_reason: Option<String>,
    /// Labels suggested for the issue.
    pub suggested_labels: Vec<String>,
    /// Quality score in 0.0-1.0.
    pub quality_score: Option<f32>,
    /// Non-fatal problems encountered along the way.
    pub errors: Vec<String>,
}

impl TriageResult {
    /// Marks the run as skipped. The first reason wins.
    pub fn mark_skipped(&mut self, reason: impl Into<String>) {
        self.skipped = true;
        if self.skip_reason.is_none() {
            self.skip_reason = Some(reason.into());
        }
    }

    /// Records a duplicate verdict unless one is already present.
    pub fn set_duplicate(&mut self, target: IssueId, confidence: f32) -> bool {
        if self.duplicate {
            return false;
        }
        self.duplicate = true;
        self.duplicate_of = Some(target);
        self.duplicate_confidence = Some(confidence);
        true
    }

    /// Records a transfer decision unless one is already present.
    pub fn set_transfer(
        &mut self,
        target: impl Into<String>,
        confidence: f32,
        reason: impl Into<String>,
    ) -> bool {
        if self.transfer_target.is_some() {
            return false;
        }
        self.transfer_target = Some(target.into());
        self.transfer_confidence = Some(confidence);
        self.transfer_reason = Some(reason.into());
        true
    }

    /// Adds suggested labels, ignoring ones already suggested.
    pub fn suggest_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            let label = label.into();
            if !self
                .suggested_labels
                .iter()
                .any(|l| eq_ignore_case(l, &label))
            {
                self.suggested_labels.push(label);
            }
        }
    }

    /// Records a non-fatal diagnostic.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Returns the best similar issue, if any.
    #[must_use]
    pub fn best_match(&self) -> Option<&SimilarIssue> {
        self.similar
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conclusions_are_not_overwritten() {
        let mut result = TriageResult::default();

        assert!(result.set_duplicate(IssueId::new("a", "b", 1), 0.9));
        assert!(!result.set_duplicate(IssueId::new("a", "b", 2), 0.99));
        assert_eq!(result.duplicate_of, Some(IssueId::new("a", "b", 1)));

        assert!(result.set_transfer("a/c", 1.0, "rule"));
        assert!(!result.set_transfer("a/d", 1.0, "other"));
        assert_eq!(result.transfer_target.as_deref(), Some("a/c"));

        result.mark_skipped("first");
        result.mark_skipped("second");
        assert_eq!(result.skip_reason.as_deref(), Some("first"));
    }

    #[test]
    fn suggested_labels_are_deduplicated() {
        let mut result = TriageResult::default();
        result.suggest_labels(["bug", "ui"]);
        result.suggest_labels(["Bug", "docs"]);

        assert_eq!(result.suggested_labels, vec!["bug", "ui", "docs"]);
    }
}
