//! The step contract.

use super::context::Context;
use super::error::BoxError;
use async_trait::async_trait;

/// What a step asks the executor to do next.
#[derive(Debug)]
pub enum StepOutcome {
    /// Proceed to the next step.
    Continue,
    /// Stop the run early. This is not an error.
    Skip {
        /// Why the remaining steps are unnecessary.
        reason: String,
    },
    /// Abort the run.
    Failed(BoxError),
}

impl StepOutcome {
    /// Creates a [`Skip`](Self::Skip) outcome.
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    /// Creates a [`Failed`](Self::Failed) outcome.
    pub fn fail(cause: impl Into<BoxError>) -> Self {
        Self::Failed(cause.into())
    }

    /// Returns a short label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Skip { .. } => "skip",
            Self::Failed(_) => "failed",
        }
    }
}

/// A named unit of triage logic.
///
/// Steps read the issue from the [`Context`] and record conclusions in its
/// result. Collaborators are bound when the step is built, see
/// [`Registry`](crate::registry::Registry).
#[async_trait]
pub trait Step: Send + Sync {
    /// Returns the step's registered name.
    fn name(&self) -> &str;

    /// Runs the step against one issue.
    async fn run(&self, ctx: &mut Context) -> StepOutcome;
}
