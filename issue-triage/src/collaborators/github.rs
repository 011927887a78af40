//! GitHub-backed issue tracker.

use super::rate_limit::ensure_core_rate_limit;
use super::{CollaboratorError, IssueTracker};
use crate::issue::{Issue, IssueId};
use async_trait::async_trait;
use octocrab::models::issues::Issue as GithubIssue;
use octocrab::Octocrab;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

/// Results per page when listing issues.
const RESULTS_PER_PAGE: u8 = 100;

const TRANSFER_MUTATION: &str = "mutation($issueId: ID!, $repositoryId: ID!) { \
transferIssue(input: {issueId: $issueId, repositoryId: $repositoryId}) { issue { number url } } }";

/// [`IssueTracker`] implementation over the GitHub REST and GraphQL APIs.
#[derive(Clone)]
pub struct GithubTracker {
    octocrab: Octocrab,
}

impl GithubTracker {
    /// Wraps an authenticated client.
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Builds a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let octocrab = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(octocrab))
    }
}

#[async_trait]
impl IssueTracker for GithubTracker {
    async fn fetch_issue(&self, id: &IssueId) -> Result<Issue, CollaboratorError> {
        debug!(issue = %id, "Fetching issue");
        let issue = self
            .octocrab
            .issues(&id.org, &id.repo)
            .get(id.number)
            .await?;
        Ok(Issue::from_github(&id.org, &id.repo, &issue))
    }

    async fn list_open_issues(
        &self,
        org: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<Issue>, CollaboratorError> {
        let span = info_span!("list_open_issues", repo = %format!("{org}/{repo}"), limit);

        async {
            let mut issues = Vec::new();
            let mut page = self
                .octocrab
                .issues(org, repo)
                .list()
                .state(octocrab::params::State::Open)
                .per_page(RESULTS_PER_PAGE)
                .send()
                .await?;

            loop {
                // The issues endpoint also returns pull requests.
                issues.extend(
                    page.items
                        .iter()
                        .filter(|issue| issue.pull_request.is_none())
                        .map(|issue| Issue::from_github(org, repo, issue)),
                );

                if issues.len() >= limit {
                    issues.truncate(limit);
                    break;
                }

                match self.octocrab.get_page::<GithubIssue>(&page.next).await? {
                    Some(next) => page = next,
                    None => break,
                }
            }

            info!(count = issues.len(), "Listed open issues");
            Ok(issues)
        }
        .instrument(span)
        .await
    }

    async fn add_labels(
        &self,
        id: &IssueId,
        labels: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        if labels.is_empty() {
            return Ok(());
        }
        ensure_core_rate_limit(&self.octocrab, cancel).await?;
        self.octocrab
            .issues(&id.org, &id.repo)
            .add_labels(id.number, labels)
            .await?;
        info!(issue = %id, ?labels, "Labels added");
        Ok(())
    }

    async fn post_comment(
        &self,
        id: &IssueId,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        ensure_core_rate_limit(&self.octocrab, cancel).await?;
        self.octocrab
            .issues(&id.org, &id.repo)
            .create_comment(id.number, body)
            .await?;
        info!(issue = %id, "Comment posted");
        Ok(())
    }

    async fn transfer_issue(
        &self,
        id: &IssueId,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        let span = info_span!("transfer_issue", issue = %id, target);

        async {
            let (target_org, target_repo) =
                target
                    .split_once('/')
                    .ok_or_else(|| CollaboratorError::InvalidResponse {
                        service: "github".to_string(),
                        message: format!("transfer target '{target}' is not 'org/repo'"),
                    })?;

            ensure_core_rate_limit(&self.octocrab, cancel).await?;
            let issue = self
                .octocrab
                .issues(&id.org, &id.repo)
                .get(id.number)
                .await?;
            let repository = self.octocrab.repos(target_org, target_repo).get().await?;
            let repository_id =
                repository
                    .node_id
                    .ok_or_else(|| CollaboratorError::InvalidResponse {
                        service: "github".to_string(),
                        message: format!("repository '{target}' has no node id"),
                    })?;

            let payload = json!({
                "query": TRANSFER_MUTATION,
                "variables": {
                    "issueId": issue.node_id,
                    "repositoryId": repository_id,
                }
            });
            let response: Value = self.octocrab.graphql(&payload).await?;
            let url = parse_transfer_response(&response)?;

            info!(new_url = %url, "Issue transferred");
            Ok(url)
        }
        .instrument(span)
        .await
    }
}

/// Extracts the new issue URL from a `transferIssue` GraphQL response.
fn parse_transfer_response(response: &Value) -> Result<String, CollaboratorError> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let message = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CollaboratorError::InvalidResponse {
                service: "github".to_string(),
                message,
            });
        }
    }

    response
        .pointer("/data/transferIssue/issue/url")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| CollaboratorError::InvalidResponse {
            service: "github".to_string(),
            message: "transferIssue response has no issue url".to_string(),
        })
}
