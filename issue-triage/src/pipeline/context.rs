//! Per-run context.

use super::result::TriageResult;
use crate::issue::Issue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Mutable state for a single pipeline run.
///
/// A context is owned by whoever executes the run and is discarded with it.
/// The metadata bag lets steps hand values to later steps of the same run.
#[derive(Debug)]
pub struct Context {
    issue: Issue,
    cancel: CancellationToken,
    result: TriageResult,
    metadata: HashMap<String, Value>,
}

impl Context {
    /// Creates a context for a run over `issue`.
    pub fn new(issue: Issue, cancel: CancellationToken) -> Self {
        Self {
            issue,
            cancel,
            result: TriageResult::default(),
            metadata: HashMap::new(),
        }
    }

    /// Returns the issue snapshot.
    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    /// Returns the run's cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the accumulated result.
    pub fn result(&self) -> &TriageResult {
        &self.result
    }

    /// Returns the accumulated result for modification.
    pub fn result_mut(&mut self) -> &mut TriageResult {
        &mut self.result
    }

    /// Stores a metadata value, replacing any previous value for `key`.
    ///
    /// A value that fails to serialize is logged and leaves `key` unset.
    pub fn insert_meta<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.metadata.insert(key, value);
            }
            Err(e) => {
                warn!(
                    issue = %self.issue.id,
                    key = %key,
                    error = %e,
                    "Could not store metadata value"
                );
                self.metadata.remove(&key);
            }
        }
    }

    /// Returns the raw metadata value for `key`.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Returns the metadata value for `key` decoded as `T`.
    ///
    /// Returns `None` if the key is absent or holds a value of another shape.
    pub fn meta_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Consumes the context, returning the accumulated result.
    pub fn into_result(self) -> TriageResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueId;

    #[test]
    fn metadata_round_trips_typed_values() {
        let issue = Issue::new(IssueId::new("acme", "widgets", 3), "Title", "bob");
        let mut ctx = Context::new(issue, CancellationToken::new());

        ctx.insert_meta("top_score", 0.75_f32);
        ctx.insert_meta("labels", vec!["bug"]);

        assert_eq!(ctx.meta_as::<f32>("top_score"), Some(0.75));
        assert_eq!(ctx.meta_as::<Vec<String>>("labels"), Some(vec!["bug".to_string()]));
        assert_eq!(ctx.meta_as::<u64>("labels"), None);
        assert!(ctx.meta("missing").is_none());
    }

    #[test]
    fn unserializable_metadata_leaves_key_unset() {
        let issue = Issue::new(IssueId::new("acme", "widgets", 3), "Title", "bob");
        let mut ctx = Context::new(issue, CancellationToken::new());
        ctx.insert_meta("pairs", 1_u8);

        // JSON object keys must be strings.
        let pairs = HashMap::from([((1_u8, 2_u8), 3_u8)]);
        ctx.insert_meta("pairs", pairs);

        assert!(ctx.meta("pairs").is_none());
    }
}
