//! Heuristic report quality scoring.

use crate::issue::Issue;
use crate::pipeline::{Context, Step, StepOutcome};
use async_trait::async_trait;
use tracing::debug;

const REPORT_KEYWORDS: [&str; 4] = ["steps to reproduce", "expected", "actual", "version"];

/// Body length at which the length component saturates.
const FULL_BODY_LEN: usize = 400;

/// Scores how actionable an issue report is.
///
/// The score is in 0.0-1.0. With a minimum configured, lower scores end the
/// run with a skip.
#[derive(Debug, Clone, Default)]
pub struct QualityStep {
    min_score: Option<f32>,
}

impl QualityStep {
    /// Creates the step with an optional minimum score.
    pub fn new(min_score: Option<f32>) -> Self {
        Self { min_score }
    }
}

/// Computes the quality score of `issue`.
///
/// Components: a descriptive title (0.2), body length (up to 0.3), a code
/// block or stack trace (0.2), and common report sections (up to 0.3).
pub fn quality_score(issue: &Issue) -> f32 {
    let mut score = 0.0;

    if issue.title.split_whitespace().count() >= 3 {
        score += 0.2;
    }

    let body_len = issue.body.trim().chars().count().min(FULL_BODY_LEN);
    score += 0.3 * body_len as f32 / FULL_BODY_LEN as f32;

    if issue.body.contains("```") || issue.body.contains("\n    at ") {
        score += 0.2;
    }

    let body = issue.body.to_lowercase();
    let sections = REPORT_KEYWORDS.iter().filter(|k| body.contains(*k)).count();
    score += 0.3 * sections as f32 / REPORT_KEYWORDS.len() as f32;

    score.clamp(0.0, 1.0)
}

#[async_trait]
impl Step for QualityStep {
    fn name(&self) -> &str {
        "quality"
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        let score = quality_score(ctx.issue());
        debug!(issue = %ctx.issue().id, score, "Scored issue quality");
        ctx.result_mut().quality_score = Some(score);

        match self.min_score {
            Some(min) if score < min => StepOutcome::skip(format!(
                "quality score {score:.2} below minimum {min:.2}"
            )),
            _ => StepOutcome::Continue,
        }
    }
}
