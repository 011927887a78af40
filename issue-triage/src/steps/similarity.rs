//! Nearest-neighbour lookup of related issues.

use crate::collaborators::{EmbeddingClient, VectorStore};
use crate::config::SimilarityConfig;
use crate::pipeline::{Context, SimilarIssue, Step, StepOutcome};
use crate::retry::RetryConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Metadata key holding the best similarity score.
pub const TOP_SCORE_KEY: &str = "similarity.top-score";

/// Finds previously indexed issues that resemble the current one.
///
/// Without an embedder or a vector store the step contributes nothing.
/// Remote failures are recorded on the result and do not stop the run.
pub struct SimilarityStep {
    embedder: Option<Arc<dyn EmbeddingClient>>,
    store: Option<Arc<dyn VectorStore>>,
    config: SimilarityConfig,
    retry: RetryConfig,
    index: bool,
}

impl SimilarityStep {
    /// Creates the step. With `index` set, the issue is also added to the store.
    pub fn new(
        embedder: Option<Arc<dyn EmbeddingClient>>,
        store: Option<Arc<dyn VectorStore>>,
        config: SimilarityConfig,
        retry: RetryConfig,
        index: bool,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
            retry,
            index,
        }
    }
}

#[async_trait]
impl Step for SimilarityStep {
    fn name(&self) -> &str {
        "similarity"
    }

    async fn run(&self, ctx: &mut Context) -> StepOutcome {
        let (Some(embedder), Some(store)) = (&self.embedder, &self.store) else {
            debug!("No embedder or vector store configured, skipping similarity search");
            return StepOutcome::Continue;
        };

        let issue = ctx.issue().clone();
        let cancel = ctx.cancellation().clone();
        let text = format!("{}\n\n{}", issue.title, issue.body);

        let embedding = match self
            .retry
            .run("embed issue", &cancel, || embedder.embed(&text))
            .await
        {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(issue = %issue.id, error = %e, "Could not embed issue");
                ctx.result_mut().record_error(format!("similarity: {e}"));
                return StepOutcome::Continue;
            }
        };

        let repository = issue.id.repository();
        // One extra slot since the issue may find itself.
        let limit = self.config.limit + 1;
        let found = match self
            .retry
            .run("search similar issues", &cancel, || {
                store.search(&repository, &embedding, limit)
            })
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(issue = %issue.id, error = %e, "Similarity search failed");
                ctx.result_mut().record_error(format!("similarity: {e}"));
                return StepOutcome::Continue;
            }
        };

        let mut similar: Vec<SimilarIssue> = found
            .into_iter()
            .filter(|s| s.id != issue.id && s.score >= self.config.min_score)
            .collect();
        similar.sort_by(|a, b| b.score.total_cmp(&a.score));
        similar.truncate(self.config.limit);

        debug!(issue = %issue.id, matches = similar.len(), "Found similar issues");
        if let Some(top) = similar.first() {
            ctx.insert_meta(TOP_SCORE_KEY, top.score);
        }
        ctx.result_mut().similar.extend(similar);

        if self.index {
            if let Err(e) = self
                .retry
                .run("index issue", &cancel, || store.upsert(&issue, &embedding))
                .await
            {
                warn!(issue = %issue.id, error = %e, "Could not index issue");
                ctx.result_mut().record_error(format!("similarity: {e}"));
            }
        }

        StepOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Issue, IssueId};
    use crate::steps::fakes::{fast_retry, similar, FakeEmbedder, FakeStore};
    use std::sync::atomic::Ordering;
    use tokio_util::sync::CancellationToken;

    fn context() -> Context {
        Context::new(
            Issue::new(IssueId::new("acme", "widgets", 1), "Crash", "jo"),
            CancellationToken::new(),
        )
    }

    fn config() -> SimilarityConfig {
        SimilarityConfig {
            limit: 2,
            min_score: 0.5,
        }
    }

    #[tokio::test]
    async fn filters_self_and_low_scores() {
        let embedder = Arc::new(FakeEmbedder::default());
        let store = Arc::new(FakeStore {
            results: vec![similar(1, 1.0), similar(7, 0.8), similar(8, 0.3), similar(9, 0.95)],
            ..FakeStore::default()
        });
        let step = SimilarityStep::new(
            Some(embedder),
            Some(store.clone()),
            config(),
            fast_retry(),
            true,
        );
        let mut ctx = context();

        assert!(matches!(step.run(&mut ctx).await, StepOutcome::Continue));

        let ids: Vec<u64> = ctx.result().similar.iter().map(|s| s.id.number).collect();
        assert_eq!(ids, vec![9, 7]);
        assert_eq!(ctx.meta_as::<f32>(TOP_SCORE_KEY), Some(0.95));
        assert_eq!(store.upserts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_transient_embedding_failures() {
        let embedder = Arc::new(FakeEmbedder {
            failures: 2,
            ..FakeEmbedder::default()
        });
        let store = Arc::new(FakeStore {
            results: vec![similar(7, 0.9)],
            ..FakeStore::default()
        });
        let step = SimilarityStep::new(
            Some(embedder.clone()),
            Some(store),
            config(),
            fast_retry(),
            false,
        );
        let mut ctx = context();

        step.run(&mut ctx).await;

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.result().similar.len(), 1);
        assert!(ctx.result().errors.is_empty());
    }

    #[tokio::test]
    async fn permanent_failure_is_recorded_not_fatal() {
        let embedder = Arc::new(FakeEmbedder {
            permanent: true,
            ..FakeEmbedder::default()
        });
        let step = SimilarityStep::new(
            Some(embedder.clone()),
            Some(Arc::new(FakeStore::default())),
            config(),
            fast_retry(),
            false,
        );
        let mut ctx = context();

        assert!(matches!(step.run(&mut ctx).await, StepOutcome::Continue));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.result().errors.len(), 1);
        assert!(ctx.result().errors[0].starts_with("similarity: embed issue failed"));
    }

    #[tokio::test]
    async fn without_collaborators_does_nothing() {
        let step = SimilarityStep::new(None, None, config(), fast_retry(), false);
        let mut ctx = context();

        assert!(matches!(step.run(&mut ctx).await, StepOutcome::Continue));
        assert!(ctx.result().similar.is_empty());
        assert!(ctx.result().errors.is_empty());
    }
}
