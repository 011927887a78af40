//! Registry error types.

use crate::pipeline::BoxError;
use thiserror::Error;

/// Errors raised while building a pipeline from step names.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory is registered under the name.
    #[error("Unknown step '{name}' (available: {available})")]
    UnknownStep { name: String, available: String },

    /// A factory refused to build its step.
    #[error("Failed to build step '{step}': {source}")]
    Factory {
        step: String,
        #[source]
        source: BoxError,
    },
}
