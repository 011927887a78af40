//! Batch summary types.

mod batch_summary;

pub use batch_summary::BatchSummary;
