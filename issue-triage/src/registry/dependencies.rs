//! Collaborators handed to step factories.

use crate::collaborators::{EmbeddingClient, IssueTracker, LlmClient, VectorStore};
use std::sync::Arc;

/// Optional collaborators available to steps at build time.
///
/// Steps must degrade gracefully when a collaborator they can live without
/// is absent. When `dry_run` is set, steps must not perform writes against
/// the tracker or the vector store.
#[derive(Clone, Default)]
pub struct Dependencies {
    /// Embedding provider.
    pub embedder: Option<Arc<dyn EmbeddingClient>>,
    /// Vector search backend.
    pub vector_store: Option<Arc<dyn VectorStore>>,
    /// Issue tracker client.
    pub tracker: Option<Arc<dyn IssueTracker>>,
    /// LLM provider.
    pub llm: Option<Arc<dyn LlmClient>>,
    /// Whether writes are simulated.
    pub dry_run: bool,
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("embedder", &self.embedder.is_some())
            .field("vector_store", &self.vector_store.is_some())
            .field("tracker", &self.tracker.is_some())
            .field("llm", &self.llm.is_some())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Dependencies {
    /// Sets the embedding provider.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Sets the vector search backend.
    #[must_use]
    pub fn with_vector_store(mut self, vector_store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(vector_store);
        self
    }

    /// Sets the issue tracker client.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<dyn IssueTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Sets the LLM provider.
    #[must_use]
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Sets the dry-run flag.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the tracker only when writes are allowed.
    pub fn writable_tracker(&self) -> Option<&Arc<dyn IssueTracker>> {
        if self.dry_run {
            None
        } else {
            self.tracker.as_ref()
        }
    }
}
