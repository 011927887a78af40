//! Collaborator error types.

use crate::retry::{Classify, ErrorClass};
use thiserror::Error;

/// Errors reported by external collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),

    /// Remote service answered with a non-success HTTP status.
    #[error("{service} returned HTTP {status}: {message}")]
    Status {
        service: String,
        status: u16,
        message: String,
    },

    /// Remote service asked us to slow down.
    #[error("{service} rate limit exceeded")]
    RateLimited { service: String },

    /// Connection-level failure.
    #[error("{service} transport error: {message}")]
    Transport { service: String, message: String },

    /// The call did not finish in time.
    #[error("{service} timed out")]
    Timeout { service: String },

    /// The service answered with something we cannot use.
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    /// The call was abandoned because the run was cancelled.
    #[error("{service} call cancelled")]
    Cancelled { service: String },
}

impl Classify for CollaboratorError {
    fn classify(&self) -> ErrorClass {
        match self {
            Self::GitHub(error) => classify_github(error),
            Self::Status { status, .. } => classify_status(*status),
            Self::RateLimited { .. } | Self::Transport { .. } | Self::Timeout { .. } => {
                ErrorClass::Transient
            }
            Self::InvalidResponse { .. } | Self::Cancelled { .. } => ErrorClass::Permanent,
        }
    }
}

/// Classifies an HTTP status code.
///
/// 408, 429 and 5xx are transient. Everything else is permanent.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        408 | 429 | 500..=599 => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Classifies a GitHub error response.
///
/// GitHub answers secondary rate limits with 403 rather than 429; those
/// responses are recognised by their documentation link.
pub fn classify_github_status(status: u16, documentation_url: Option<&str>) -> ErrorClass {
    match (status, documentation_url) {
        (403, Some(url)) if url.contains("rate-limit") => ErrorClass::Transient,
        _ => classify_status(status),
    }
}

fn classify_github(error: &octocrab::Error) -> ErrorClass {
    match error {
        octocrab::Error::GitHub { source, .. } => classify_github_status(
            source.status_code.as_u16(),
            source.documentation_url.as_deref(),
        ),
        octocrab::Error::Hyper { .. } | octocrab::Error::Service { .. } => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_status_code() {
        assert_eq!(classify_status(429), ErrorClass::Transient);
        assert_eq!(classify_status(503), ErrorClass::Transient);
        assert_eq!(classify_status(408), ErrorClass::Transient);
        assert_eq!(classify_status(400), ErrorClass::Permanent);
        assert_eq!(classify_status(401), ErrorClass::Permanent);
        assert_eq!(classify_status(404), ErrorClass::Permanent);
    }

    #[test]
    fn github_secondary_rate_limit_is_transient() {
        let rate_limited = Some(
            "https://docs.github.com/rest/overview/rate-limits-for-the-rest-api#about-secondary-rate-limits",
        );
        assert_eq!(
            classify_github_status(403, rate_limited),
            ErrorClass::Transient
        );
        assert_eq!(
            classify_github_status(403, Some("https://docs.github.com/rest/issues/comments")),
            ErrorClass::Permanent
        );
        assert_eq!(classify_github_status(403, None), ErrorClass::Permanent);
        assert_eq!(classify_github_status(502, None), ErrorClass::Transient);
        assert_eq!(classify_github_status(404, rate_limited), ErrorClass::Permanent);
    }

    #[test]
    fn classifies_github_client_errors() {
        let malformed = octocrab::Error::Serde {
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
            backtrace: std::backtrace::Backtrace::capture(),
        };
        assert_eq!(
            CollaboratorError::GitHub(malformed).classify(),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn classifies_typed_variants() {
        let service = "vector-store".to_string();
        assert_eq!(
            CollaboratorError::Timeout {
                service: service.clone()
            }
            .classify(),
            ErrorClass::Transient
        );
        assert_eq!(
            CollaboratorError::Status {
                service: service.clone(),
                status: 502,
                message: "bad gateway".to_string(),
            }
            .classify(),
            ErrorClass::Transient
        );
        assert_eq!(
            CollaboratorError::Cancelled {
                service: service.clone()
            }
            .classify(),
            ErrorClass::Permanent
        );
        // Message text never influences the decision.
        assert_eq!(
            CollaboratorError::InvalidResponse {
                service,
                message: "rate limit 503 timeout".to_string(),
            }
            .classify(),
            ErrorClass::Permanent
        );
    }
}
