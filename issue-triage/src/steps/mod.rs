//! Built-in triage steps.
//!
//! | Name         | Needs                   | Effect                                  |
//! |--------------|-------------------------|-----------------------------------------|
//! | `gate`       |                         | skips closed, bot and opted-out issues  |
//! | `quality`    |                         | scores the report, optionally skips     |
//! | `similarity` | embedder, vector store  | fills `similar`                         |
//! | `duplicate`  | tracker for writes      | flags duplicates, comments and labels   |
//! | `labels`     | language model          | suggests labels                         |
//! | `transfer`   | tracker for writes      | routes the issue by transfer rules      |
//!
//! Steps whose collaborators are missing contribute nothing. Writes only
//! happen when the dependencies are not in dry-run mode.

mod duplicate;
mod gate;
mod labels;
mod quality;
mod similarity;
mod transfer;

#[cfg(test)]
pub(crate) mod fakes;

pub use duplicate::DuplicateStep;
pub use gate::GateStep;
pub use labels::{parse_labels, LabelStep};
pub use quality::{quality_score, QualityStep};
pub use similarity::{SimilarityStep, TOP_SCORE_KEY};
pub use transfer::{TransferStep, TRANSFERRED_URL_KEY};

use crate::config::TriageConfig;
use crate::pipeline::Step;
use crate::registry::Registry;
use crate::templates::CommentRenderer;
use crate::transfer::RuleMatcher;
use std::sync::Arc;

/// Registers every built-in step, configured from `config`.
pub(crate) fn register_builtin(registry: &mut Registry, config: &TriageConfig) {
    let skip_labels = config.skip_labels.clone();
    registry.register("gate", move |_deps| {
        Ok(Arc::new(GateStep::new(skip_labels.clone())) as Arc<dyn Step>)
    });

    let min_score = config.quality.min_score;
    registry.register("quality", move |_deps| {
        Ok(Arc::new(QualityStep::new(min_score)) as Arc<dyn Step>)
    });

    let similarity = config.similarity.clone();
    let retry = config.retry.clone();
    registry.register("similarity", move |deps| {
        Ok(Arc::new(SimilarityStep::new(
            deps.embedder.clone(),
            deps.vector_store.clone(),
            similarity.clone(),
            retry.clone(),
            !deps.dry_run,
        )) as Arc<dyn Step>)
    });

    let duplicate = config.duplicate.clone();
    let retry = config.retry.clone();
    registry.register("duplicate", move |deps| {
        let renderer = CommentRenderer::duplicate(&duplicate.comment_template)?;
        Ok(Arc::new(DuplicateStep::new(
            duplicate.threshold,
            duplicate.label.clone(),
            renderer,
            deps.writable_tracker().cloned(),
            retry.clone(),
        )) as Arc<dyn Step>)
    });

    let candidates = config.candidate_labels.clone();
    let retry = config.retry.clone();
    registry.register("labels", move |deps| {
        Ok(Arc::new(LabelStep::new(
            deps.llm.clone(),
            candidates.clone(),
            deps.writable_tracker().cloned(),
            retry.clone(),
        )) as Arc<dyn Step>)
    });

    let transfer = config.transfer.clone();
    let retry = config.retry.clone();
    registry.register("transfer", move |deps| {
        Ok(Arc::new(TransferStep::new(
            RuleMatcher::new(transfer.rules.clone()),
            CommentRenderer::transfer(&transfer.comment_template)?,
            deps.writable_tracker().cloned(),
            retry.clone(),
        )) as Arc<dyn Step>)
    });
}
