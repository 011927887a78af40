#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod batch;
pub mod collaborators;
pub mod config;
pub mod duplicates;
pub mod issue;
pub mod pipeline;
pub mod registry;
pub mod retry;
pub mod runner;
pub mod steps;
pub mod summary;
pub mod templates;
pub mod transfer;

pub use batch::{BatchError, BatchHarness, BatchItem};
pub use collaborators::{
    classify_github_status, classify_status, ensure_core_rate_limit, wait_for_reset,
    CollaboratorError, EmbeddingClient, GithubTracker, IssueTracker, LlmClient, RateLimitInfo,
    VectorStore,
};
pub use config::{ConfigError, TriageConfig, DEFAULT_STEPS};
pub use duplicates::{resolve_duplicate_chains, walk_chain, ChainReport, ChainWalk, Redirect};
pub use issue::{Issue, IssueEvent, IssueId, IssueState, ParseIssueIdError};
pub use pipeline::{
    BoxError, Context, ObservedStep, Pipeline, PipelineError, RunOutcome, SimilarIssue, Step,
    StepObserver, StepOutcome, TracingObserver, TriageResult,
};
pub use registry::{Dependencies, Registry, RegistryError, StepFactory};
pub use retry::{Classify, ErrorClass, RetryConfig, RetryError};
pub use runner::{BatchReport, Runner, RunnerConfig, RunnerError};
pub use summary::BatchSummary;
pub use templates::{create_handlebars_registry, CommentRenderer, TemplateError};
pub use transfer::{RuleMatcher, TransferDecision, TransferMatch, TransferRule};
