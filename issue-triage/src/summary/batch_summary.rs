//! Batch summary counters.

use crate::batch::BatchItem;
use serde::Serialize;

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Number of issues in the batch.
    pub total: usize,

    /// Number of issues whose pipeline ran to the end.
    pub triaged: usize,

    /// Number of issues a step skipped.
    pub skipped: usize,

    /// Number of issues flagged as duplicates.
    pub duplicates: usize,

    /// Number of issues with a transfer target.
    pub transfers: usize,

    /// Number of issues whose run failed.
    pub failed: usize,

    /// Number of non-fatal diagnostics across all results.
    pub diagnostics: usize,
}

impl BatchSummary {
    /// Creates a summary from completed batch items.
    #[must_use]
    pub fn from_items(items: &[BatchItem]) -> Self {
        let mut summary = Self::default();
        for item in items {
            summary.record_item(item);
        }
        summary
    }

    /// Updates the summary with one batch item.
    pub fn record_item(&mut self, item: &BatchItem) {
        self.total += 1;
        let Some(result) = item.result() else {
            self.failed += 1;
            return;
        };

        if result.skipped {
            self.skipped += 1;
        } else {
            self.triaged += 1;
        }
        if result.duplicate {
            self.duplicates += 1;
        }
        if result.transfer_target.is_some() {
            self.transfers += 1;
        }
        self.diagnostics += result.errors.len();
    }

    /// Returns true if any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
