//! In-memory collaborators for step tests.

use crate::collaborators::{
    CollaboratorError, EmbeddingClient, IssueTracker, LlmClient, VectorStore,
};
use crate::issue::{Issue, IssueId, IssueState};
use crate::pipeline::SimilarIssue;
use crate::retry::RetryConfig;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn fast_retry() -> RetryConfig {
    RetryConfig::new(3, Duration::from_millis(1), Duration::from_millis(2), 0.0)
}

pub(crate) fn similar(number: u64, score: f32) -> SimilarIssue {
    SimilarIssue {
        id: IssueId::new("acme", "widgets", number),
        title: format!("Issue {number}"),
        score,
        state: IssueState::Open,
    }
}

/// Fails transiently `failures` times, then returns a fixed vector.
#[derive(Default)]
pub(crate) struct FakeEmbedder {
    pub failures: u32,
    pub permanent: bool,
    pub calls: AtomicU32,
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, CollaboratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.permanent {
            return Err(CollaboratorError::Status {
                service: "embeddings".to_string(),
                status: 401,
                message: "bad key".to_string(),
            });
        }
        if call < self.failures {
            return Err(CollaboratorError::Timeout {
                service: "embeddings".to_string(),
            });
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    pub results: Vec<SimilarIssue>,
    pub upserts: Mutex<Vec<IssueId>>,
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn search(
        &self,
        _repository: &str,
        _embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SimilarIssue>, CollaboratorError> {
        Ok(self.results.iter().take(limit).cloned().collect())
    }

    async fn upsert(&self, issue: &Issue, _embedding: &[f32]) -> Result<(), CollaboratorError> {
        self.upserts.lock().unwrap().push(issue.id.clone());
        Ok(())
    }
}

/// Records every write; optionally rejects them.
#[derive(Default)]
pub(crate) struct FakeTracker {
    pub reject_writes: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTracker {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn write(&self, call: String) -> Result<(), CollaboratorError> {
        if self.reject_writes {
            return Err(CollaboratorError::Status {
                service: "github".to_string(),
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn fetch_issue(&self, id: &IssueId) -> Result<Issue, CollaboratorError> {
        Ok(Issue::new(id.clone(), "Fetched", "someone"))
    }

    async fn list_open_issues(
        &self,
        _org: &str,
        _repo: &str,
        _limit: usize,
    ) -> Result<Vec<Issue>, CollaboratorError> {
        Ok(Vec::new())
    }

    async fn add_labels(
        &self,
        id: &IssueId,
        labels: &[String],
        _cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        self.write(format!("labels {id} {}", labels.join(",")))
    }

    async fn post_comment(
        &self,
        id: &IssueId,
        body: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        self.write(format!("comment {id} {body}"))
    }

    async fn transfer_issue(
        &self,
        id: &IssueId,
        target: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        self.write(format!("transfer {id} {target}"))?;
        Ok(format!("https://github.com/{target}/issues/1"))
    }
}

pub(crate) struct FakeLlm {
    pub reply: Result<String, u16>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|status| CollaboratorError::Status {
            service: "llm".to_string(),
            status,
            message: "unavailable".to_string(),
        })
    }
}
