//! Triage configuration loading.
//!
//! The configuration lives in a single TOML file:
//!
//! ```toml
//! steps = ["gate", "similarity", "duplicate", "transfer"]
//! concurrency = 4
//! skip-labels = ["wontfix"]
//!
//! [retry]
//! max-attempts = 3
//! base-delay-ms = 500
//!
//! [duplicate]
//! threshold = 0.92
//!
//! [transfer]
//! comment-template = "Moving this to {{target}}."
//!
//! [[transfer.rules]]
//! name = "bugs"
//! priority = 10
//! target = "acme/bugs"
//! any-labels = ["bug"]
//! ```

mod error;
mod sections;

pub use error::ConfigError;
pub use sections::{
    DuplicateConfig, QualityConfig, SimilarityConfig, TransferConfig, DEFAULT_DUPLICATE_COMMENT,
    DEFAULT_TRANSFER_COMMENT,
};

use crate::retry::RetryConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Steps run when the configuration does not list any.
pub const DEFAULT_STEPS: [&str; 6] = [
    "gate",
    "quality",
    "similarity",
    "duplicate",
    "labels",
    "transfer",
];

/// Complete triage configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TriageConfig {
    /// Step names, in execution order.
    pub steps: Vec<String>,
    /// Number of batch workers.
    pub concurrency: usize,
    /// Issues carrying any of these labels are skipped.
    pub skip_labels: Vec<String>,
    /// Labels the `labels` step may suggest.
    pub candidate_labels: Vec<String>,
    /// Retry policy for remote calls.
    pub retry: RetryConfig,
    /// `similarity` step settings.
    pub similarity: SimilarityConfig,
    /// `duplicate` step settings.
    pub duplicate: DuplicateConfig,
    /// `quality` step settings.
    pub quality: QualityConfig,
    /// `transfer` step settings.
    pub transfer: TransferConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS.iter().map(|s| s.to_string()).collect(),
            concurrency: 4,
            skip_labels: Vec::new(),
            candidate_labels: Vec::new(),
            retry: RetryConfig::default(),
            similarity: SimilarityConfig::default(),
            duplicate: DuplicateConfig::default(),
            quality: QualityConfig::default(),
            transfer: TransferConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Loads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, malformed
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading triage config");

        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })?;

        config.validate(path)?;
        info!(
            path = %path.display(),
            steps = config.steps.len(),
            rules = config.transfer.rules.len(),
            "Loaded triage config"
        );
        Ok(config)
    }

    /// Loads the configuration at `path`, falling back to defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be loaded.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "No triage config found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let fail = |message: String| ConfigError::ValidationError {
            path: path.display().to_string(),
            message,
        };

        if self.steps.is_empty() {
            return Err(fail("steps must list at least one step".to_string()));
        }

        if self.concurrency == 0 {
            return Err(fail("concurrency must be at least 1".to_string()));
        }

        self.retry
            .validate()
            .map_err(|message| fail(format!("retry: {message}")))?;

        if !(0.0..=1.0).contains(&self.duplicate.threshold) {
            return Err(fail(format!(
                "duplicate.threshold must be within 0.0-1.0, got {}",
                self.duplicate.threshold
            )));
        }

        if let Some(min) = self.quality.min_score {
            if !(0.0..=1.0).contains(&min) {
                return Err(fail(format!(
                    "quality.min-score must be within 0.0-1.0, got {min}"
                )));
            }
        }

        let mut names = HashSet::new();
        for rule in &self.transfer.rules {
            rule.validate()
                .map_err(|message| fail(format!("transfer: {message}")))?;
            if !names.insert(rule.name.as_str()) {
                return Err(fail(format!(
                    "transfer: duplicate rule name '{}'",
                    rule.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = temp.path().join("triage.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_full_config() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
steps = ["gate", "transfer"]
concurrency = 8
skip-labels = ["wontfix"]
candidate-labels = ["bug", "docs"]

[retry]
max-attempts = 5
base-delay-ms = 100
max-delay-ms = 2000
jitter = 0.1

[duplicate]
threshold = 0.95

[quality]
min-score = 0.3

[transfer]
comment-template = "Sending to {{target}}."

[[transfer.rules]]
name = "bugs"
priority = 10
target = "acme/bugs"
any-labels = ["bug"]

[[transfer.rules]]
name = "docs"
enabled = false
target = "acme/docs"
"#,
        );

        let config = TriageConfig::load(&path).unwrap();

        assert_eq!(config.steps, vec!["gate", "transfer"]);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.skip_labels, vec!["wontfix"]);
        assert_eq!(config.retry.max_attempts(), 5);
        assert_eq!(config.retry.base_delay().as_millis(), 100);
        assert_eq!(config.duplicate.threshold, 0.95);
        assert_eq!(config.duplicate.label, "duplicate");
        assert_eq!(config.quality.min_score, Some(0.3));
        assert_eq!(config.transfer.comment_template, "Sending to {{target}}.");
        assert_eq!(config.duplicate.comment_template, DEFAULT_DUPLICATE_COMMENT);
        assert_eq!(config.transfer.rules.len(), 2);
        assert_eq!(config.transfer.rules[0].any_labels, vec!["bug"]);
        assert!(!config.transfer.rules[1].enabled);
        assert_eq!(config.transfer.rules[1].priority, 0);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");

        let config = TriageConfig::load(&path).unwrap();

        assert_eq!(config, TriageConfig::default());
        assert_eq!(config.steps.len(), DEFAULT_STEPS.len());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");

        assert!(matches!(
            TriageConfig::load(&path),
            Err(ConfigError::MissingFile { .. })
        ));
        assert_eq!(
            TriageConfig::load_or_default(&path).unwrap(),
            TriageConfig::default()
        );
    }

    #[test]
    fn reports_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "steps = [");

        assert!(matches!(
            TriageConfig::load(&path),
            Err(ConfigError::TomlError { .. })
        ));
    }

    #[test]
    fn rejects_bad_rule_target() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[[transfer.rules]]
name = "bad"
target = "not-a-repo"
"#,
        );

        let error = TriageConfig::load(&path).unwrap_err();
        assert!(matches!(error, ConfigError::ValidationError { .. }));
        assert!(error.to_string().contains("org/repo"));
    }

    #[test]
    fn rejects_duplicate_rule_names() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[[transfer.rules]]
name = "same"
target = "acme/a"

[[transfer.rules]]
name = "same"
target = "acme/b"
"#,
        );

        assert!(matches!(
            TriageConfig::load(&path),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn rejects_zero_concurrency_and_bad_retry() {
        let temp = TempDir::new().unwrap();

        let path = write_config(&temp, "concurrency = 0");
        assert!(matches!(
            TriageConfig::load(&path),
            Err(ConfigError::ValidationError { .. })
        ));

        let path = write_config(&temp, "[retry]\nmax-attempts = 0");
        assert!(matches!(
            TriageConfig::load(&path),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
