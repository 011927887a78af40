//! Runner error types.

use crate::collaborators::CollaboratorError;
use crate::retry::RetryError;

/// Errors that can occur while running triage.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// The pipeline could not be built.
    #[error(transparent)]
    Registry(#[from] crate::registry::RegistryError),

    /// Issues could not be read from the tracker.
    #[error(transparent)]
    Tracker(#[from] RetryError<CollaboratorError>),

    /// A single-issue run failed.
    #[error(transparent)]
    Pipeline(#[from] crate::pipeline::PipelineError),
}
