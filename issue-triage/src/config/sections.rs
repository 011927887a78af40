//! Per-step configuration sections.

use crate::transfer::TransferRule;
use serde::Deserialize;

/// Default comment posted on issues flagged as duplicates.
pub const DEFAULT_DUPLICATE_COMMENT: &str =
    "This issue looks like a duplicate of {{target}} ({{confidence}}% similar).";

/// Default comment posted before an issue is transferred.
pub const DEFAULT_TRANSFER_COMMENT: &str = "Moving this issue to {{target}}: {{reason}}.";

/// Settings for the `similarity` step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SimilarityConfig {
    /// Maximum number of similar issues to keep.
    pub limit: usize,
    /// Scores below this are discarded.
    pub min_score: f32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            min_score: 0.5,
        }
    }
}

/// Settings for the `duplicate` step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DuplicateConfig {
    /// Minimum similarity for a duplicate verdict.
    pub threshold: f32,
    /// Handlebars template for the comment posted on duplicates.
    pub comment_template: String,
    /// Label applied to duplicates.
    pub label: String,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            comment_template: DEFAULT_DUPLICATE_COMMENT.to_string(),
            label: "duplicate".to_string(),
        }
    }
}

/// Settings for the `quality` step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QualityConfig {
    /// Issues scoring below this end the run with a skip.
    pub min_score: Option<f32>,
}

/// Settings for the `transfer` step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TransferConfig {
    /// Routing rules.
    pub rules: Vec<TransferRule>,
    /// Handlebars template for the comment posted before a transfer.
    pub comment_template: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            comment_template: DEFAULT_TRANSFER_COMMENT.to_string(),
        }
    }
}
