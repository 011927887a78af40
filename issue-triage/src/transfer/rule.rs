//! Transfer rule definition.

use crate::issue::{eq_ignore_case, Issue};
use serde::{Deserialize, Serialize};

/// Declarative routing rule.
///
/// Every non-empty predicate group must hold for the rule to match. A rule
/// with no predicate groups matches every issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransferRule {
    /// Rule name, used in match reasons.
    pub name: String,

    /// Higher priorities are evaluated first.
    #[serde(default)]
    pub priority: i32,

    /// Disabled rules never match.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Destination repository in `org/repo` form.
    pub target: String,

    /// Every listed label must be present.
    #[serde(default)]
    pub exact_labels: Vec<String>,

    /// At least one listed label must be present.
    #[serde(default)]
    pub any_labels: Vec<String>,

    /// At least one listed substring must occur in the title.
    #[serde(default)]
    pub title_substrings: Vec<String>,

    /// At least one listed substring must occur in the body.
    #[serde(default)]
    pub body_substrings: Vec<String>,

    /// The author must be one of these logins.
    #[serde(default)]
    pub authors: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl TransferRule {
    /// Creates an enabled catch-all rule.
    pub fn new(name: impl Into<String>, priority: i32, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: true,
            target: target.into(),
            exact_labels: Vec::new(),
            any_labels: Vec::new(),
            title_substrings: Vec::new(),
            body_substrings: Vec::new(),
            authors: Vec::new(),
        }
    }

    /// Returns true if the rule has no predicate groups.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.exact_labels.is_empty()
            && self.any_labels.is_empty()
            && self.title_substrings.is_empty()
            && self.body_substrings.is_empty()
            && self.authors.is_empty()
    }

    /// Checks the rule definition, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("rule name must not be empty".to_string());
        }
        match self.target.split_once('/') {
            Some((org, repo)) if !org.is_empty() && !repo.is_empty() && !repo.contains('/') => {}
            _ => {
                return Err(format!(
                    "rule '{}' target '{}' must be in 'org/repo' form",
                    self.name, self.target
                ))
            }
        }
        Ok(())
    }

    /// Evaluates every specified predicate group against `issue`.
    ///
    /// Returns the descriptions of the satisfied groups, or `None` if any
    /// specified group fails.
    pub(crate) fn evaluate(&self, issue: &Issue) -> Option<Vec<String>> {
        let mut matched = Vec::new();

        if !self.exact_labels.is_empty() {
            if !self.exact_labels.iter().all(|l| issue.has_label(l)) {
                return None;
            }
            matched.push(format!("labels [{}]", self.exact_labels.join(", ")));
        }

        if !self.any_labels.is_empty() {
            let label = self.any_labels.iter().find(|l| issue.has_label(l))?;
            matched.push(format!("label '{label}'"));
        }

        if !self.title_substrings.is_empty() {
            let needle = find_substring(&issue.title, &self.title_substrings)?;
            matched.push(format!("title contains '{needle}'"));
        }

        if !self.body_substrings.is_empty() {
            let needle = find_substring(&issue.body, &self.body_substrings)?;
            matched.push(format!("body contains '{needle}'"));
        }

        if !self.authors.is_empty() {
            let author = self
                .authors
                .iter()
                .find(|a| eq_ignore_case(a, &issue.author))?;
            matched.push(format!("author '{author}'"));
        }

        Some(matched)
    }
}

/// Returns the first needle occurring in `haystack`, ignoring case.
fn find_substring<'a>(haystack: &str, needles: &'a [String]) -> Option<&'a String> {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .find(|needle| haystack.contains(&needle.to_lowercase()))
}
