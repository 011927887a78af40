//! Issue snapshots.
//!
//! An [`Issue`] is captured once before a run and is never mutated by the
//! pipeline. Steps read it through the run's [`Context`](crate::pipeline::Context).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies an issue by organization, repository and number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueId {
    /// Owning organization or user.
    pub org: String,
    /// Repository name.
    pub repo: String,
    /// Issue number within the repository.
    pub number: u64,
}

impl IssueId {
    /// Creates a new issue identifier.
    pub fn new(org: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Returns the repository in `org/repo` form.
    #[must_use]
    pub fn repository(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.org, self.repo, self.number)
    }
}

/// Error returned when parsing an [`IssueId`] from text fails.
#[derive(Debug, Error)]
#[error("Invalid issue reference '{input}': expected 'org/repo#number'")]
pub struct ParseIssueIdError {
    input: String,
}

impl FromStr for IssueId {
    type Err = ParseIssueIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseIssueIdError {
            input: s.to_string(),
        };

        let (repository, number) = s.rsplit_once('#').ok_or_else(invalid)?;
        let (org, repo) = repository.split_once('/').ok_or_else(invalid)?;
        if org.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }
        let number = number.parse::<u64>().map_err(|_| invalid())?;

        Ok(Self::new(org, repo, number))
    }
}

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

/// Webhook event that caused the issue to be triaged, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    /// Event name (e.g. "issues").
    pub name: String,
    /// Event action (e.g. "opened", "reopened").
    pub action: Option<String>,
    /// Login of the user who triggered the event.
    pub sender: Option<String>,
}

/// Immutable snapshot of an issue taken before a triage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue identity.
    pub id: IssueId,
    /// Issue title.
    pub title: String,
    /// Issue body (empty when the issue has no description).
    pub body: String,
    /// Open/closed state.
    pub state: IssueState,
    /// Label names currently applied.
    pub labels: Vec<String>,
    /// Author login.
    pub author: String,
    /// Browser URL of the issue.
    pub url: String,
    /// Triggering event, when triaging from a webhook.
    pub event: Option<IssueEvent>,
}

impl Issue {
    /// Creates an open issue with no labels, body or event.
    pub fn new(id: IssueId, title: impl Into<String>, author: impl Into<String>) -> Self {
        let url = format!(
            "https://github.com/{}/{}/issues/{}",
            id.org, id.repo, id.number
        );
        Self {
            id,
            title: title.into(),
            body: String::new(),
            state: IssueState::Open,
            labels: Vec::new(),
            author: author.into(),
            url,
            event: None,
        }
    }

    /// Builds a snapshot from a GitHub API issue.
    pub fn from_github(org: &str, repo: &str, issue: &octocrab::models::issues::Issue) -> Self {
        let state = match issue.state {
            octocrab::models::IssueState::Closed => IssueState::Closed,
            _ => IssueState::Open,
        };

        Self {
            id: IssueId::new(org, repo, issue.number),
            title: issue.title.clone(),
            body: issue.body.clone().unwrap_or_default(),
            state,
            labels: issue.labels.iter().map(|l| l.name.clone()).collect(),
            author: issue.user.login.clone(),
            url: issue.html_url.to_string(),
            event: None,
        }
    }

    /// Returns true if the issue carries the label (case-insensitive).
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| eq_ignore_case(l, label))
    }

    /// Returns true if the issue is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}

/// Compares names ignoring case.
///
/// Uses Unicode lowercase mapping, the same rule substring matching applies.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_issue_reference() {
        let id: IssueId = "acme/widgets#42".parse().unwrap();
        assert_eq!(id, IssueId::new("acme", "widgets", 42));
        assert_eq!(id.to_string(), "acme/widgets#42");
        assert_eq!(id.repository(), "acme/widgets");
    }

    #[test]
    fn rejects_malformed_references() {
        for input in ["acme/widgets", "acme#1", "/widgets#1", "acme/#1", "a/b/c#1", "a/b#x"] {
            assert!(input.parse::<IssueId>().is_err(), "accepted {input}");
        }
    }

    #[test]
    fn label_lookup_ignores_case() {
        let mut issue = Issue::new(IssueId::new("acme", "widgets", 1), "Crash", "alice");
        issue.labels = vec!["Bug".to_string()];

        assert!(issue.has_label("bug"));
        assert!(!issue.has_label("feature"));
        assert!(issue.is_open());
        assert_eq!(issue.url, "https://github.com/acme/widgets/issues/1");
    }

    #[test]
    fn case_folding_covers_non_ascii() {
        let mut issue = Issue::new(IssueId::new("acme", "widgets", 1), "Crash", "alice");
        issue.labels = vec!["Éditeur".to_string()];

        assert!(issue.has_label("éditeur"));
        assert!(issue.has_label("ÉDITEUR"));
        assert!(eq_ignore_case("ΣΟΦΊΑ", "σοφία"));
        assert!(!eq_ignore_case("éditeur", "editeur"));
    }
}
