//! Batch error types.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Errors recorded against a single batch item.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The item's pipeline run failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The worker handling the item stopped before reporting it.
    #[error("Batch worker stopped before reporting this item")]
    WorkerLost,
}
