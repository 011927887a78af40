//! Retry error types.

use thiserror::Error;

/// Whether a failed call is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limiting, server-side or infrastructure failure.
    Transient,
    /// Bad request, authentication, missing resource and similar.
    Permanent,
}

/// Classifies an error for the retry policy.
///
/// Implementations inspect status codes and typed error variants. They must
/// not look at the error's display text.
pub trait Classify {
    /// Returns the retry class of this error.
    fn classify(&self) -> ErrorClass;
}

/// Errors produced by [`RetryConfig::run`](super::RetryConfig::run).
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The operation failed with a permanent error and was not retried.
    #[error("{operation} failed: {source}")]
    Permanent {
        operation: String,
        #[source]
        source: E,
    },

    /// The operation kept failing with transient errors.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    Exhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: E,
    },

    /// Cancellation was requested before the operation succeeded.
    #[error("{operation} cancelled after {attempts} attempts")]
    Cancelled { operation: String, attempts: u32 },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the last error reported by the operation, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Permanent { source, .. } | Self::Exhausted { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    /// Consumes the error, returning the last operation error if any.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Permanent { source, .. } | Self::Exhausted { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }
}
