//! External collaborators injected into steps.
//!
//! Steps never construct clients themselves. They receive shared handles
//! through [`Dependencies`](crate::registry::Dependencies); every handle must
//! tolerate concurrent use from many batch workers.

mod error;
mod github;
mod rate_limit;

pub use error::{classify_github_status, classify_status, CollaboratorError};
pub use github::GithubTracker;
pub use rate_limit::{ensure_core_rate_limit, wait_for_reset, RateLimitInfo};

use crate::issue::{Issue, IssueId};
use crate::pipeline::SimilarIssue;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Turns text into embedding vectors.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embeds `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError>;
}

/// Nearest-neighbour search over previously indexed issues.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns up to `limit` issues of `repository` closest to `embedding`.
    async fn search(
        &self,
        repository: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarIssue>, CollaboratorError>;

    /// Indexes `issue` under `embedding`.
    async fn upsert(&self, issue: &Issue, embedding: &[f32]) -> Result<(), CollaboratorError>;
}

/// Read and write access to the issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetches a single issue.
    async fn fetch_issue(&self, id: &IssueId) -> Result<Issue, CollaboratorError>;

    /// Lists up to `limit` open issues of a repository, newest first.
    async fn list_open_issues(
        &self,
        org: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<Issue>, CollaboratorError>;

    /// Adds labels to an issue.
    ///
    /// Waits on the tracker's own throttling are abandoned once `cancel` fires.
    async fn add_labels(
        &self,
        id: &IssueId,
        labels: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError>;

    /// Posts a comment on an issue.
    async fn post_comment(
        &self,
        id: &IssueId,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError>;

    /// Moves an issue to `target` (`org/repo`), returning its new URL.
    async fn transfer_issue(
        &self,
        id: &IssueId,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;
}

/// Text completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Completes `prompt`, returning the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError>;
}
