//! Pipeline error types.

use thiserror::Error;

/// Boxed error type used as the cause of a failed step.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A step reported failure.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: BoxError,
    },
}

impl PipelineError {
    /// Returns the name of the step responsible for the failure.
    pub fn step(&self) -> &str {
        match self {
            Self::StepFailed { step, .. } => step,
        }
    }
}
