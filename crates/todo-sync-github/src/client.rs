use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use todo_sync_core::{
    IssueEdit, IssueListQuery, IssuePage, IssueState, IssueTracker, NewIssue, RepoRef,
    TrackerIssue,
};

use crate::transport::{
    is_retryable_github_status, is_retryable_transport_error, parse_next_page, parse_retry_after,
    retry_delay, truncate_for_error,
};

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone, Deserialize)]
struct GithubIssueLabel {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubIssue {
    id: u64,
    number: u64,
    title: String,
    state: IssueState,
    #[serde(default)]
    labels: Vec<GithubIssueLabel>,
    #[serde(default)]
    pull_request: Option<Value>,
}

impl From<GithubIssue> for TrackerIssue {
    fn from(issue: GithubIssue) -> Self {
        Self {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            state: issue.state,
            labels: issue.labels.into_iter().map(|label| label.name).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubCommit {
    #[serde(default)]
    author: Option<GithubUser>,
}

#[derive(Debug, Clone)]
/// Connection settings for [`GithubApiClient`].
pub struct GithubClientConfig {
    pub api_base: String,
    pub token: String,
    /// Repository whose issues are listed and mutated.
    pub issue_repo: RepoRef,
    /// Repository whose commits are looked up.
    pub code_repo: RepoRef,
    pub request_timeout_ms: u64,
    /// Total attempts per request; 1 disables retries.
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    issue_repo: RepoRef,
    code_repo: RepoRef,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl GithubApiClient {
    pub fn new(config: GithubClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("todo-sync"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            issue_repo: config.issue_repo,
            code_repo: config.code_repo,
            retry_max_attempts: config.retry_max_attempts.max(1),
            retry_base_delay_ms: config.retry_base_delay_ms.max(1),
        })
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.api_base, self.issue_repo.owner, self.issue_repo.name
        )
    }

    async fn request_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let response = self.send(operation, request_builder).await?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode github {operation}"))
    }

    async fn send<F>(&self, operation: &str, mut request_builder: F) -> Result<reqwest::Response>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = request_builder()
                .header(
                    "x-todo-sync-retry-attempt",
                    attempt.saturating_sub(1).to_string(),
                )
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts
                        && is_retryable_github_status(status.as_u16())
                    {
                        tracing::debug!(
                            operation,
                            attempt,
                            status = status.as_u16(),
                            "retrying github request"
                        );
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    bail!(
                        "github api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, ERROR_BODY_MAX_CHARS)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("github api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl IssueTracker for GithubApiClient {
    async fn list_issues(&self, query: &IssueListQuery) -> Result<IssuePage> {
        let url = self.issues_url();
        let per_page = query.per_page.to_string();
        let page = query.page.to_string();
        let response = self
            .send("list issues", || {
                self.http.get(&url).query(&[
                    ("labels", query.label.as_str()),
                    ("state", query.state.as_str()),
                    ("per_page", per_page.as_str()),
                    ("page", page.as_str()),
                ])
            })
            .await?;
        let next_page = parse_next_page(response.headers());
        let rows = response
            .json::<Vec<GithubIssue>>()
            .await
            .context("failed to decode github list issues")?;
        Ok(IssuePage {
            issues: rows
                .into_iter()
                .filter(|issue| issue.pull_request.is_none())
                .map(TrackerIssue::from)
                .collect(),
            next_page,
        })
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackerIssue> {
        let url = self.issues_url();
        let created: GithubIssue = self
            .request_json("create issue", || self.http.post(&url).json(issue))
            .await?;
        Ok(created.into())
    }

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<TrackerIssue> {
        let url = format!("{}/{}", self.issues_url(), number);
        let edited: GithubIssue = self
            .request_json("edit issue", || self.http.patch(&url).json(edit))
            .await?;
        Ok(edited.into())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let url = format!("{}/{}/comments", self.issues_url(), number);
        let payload = json!({ "body": body });
        self.send("create issue comment", || self.http.post(&url).json(&payload))
            .await?;
        Ok(())
    }

    async fn commit_author(&self, sha: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, self.code_repo.owner, self.code_repo.name, sha
        );
        let commit: GithubCommit = self
            .request_json("get commit", || self.http.get(&url))
            .await?;
        Ok(commit
            .author
            .map(|author| author.login)
            .filter(|login| !login.trim().is_empty()))
    }
}
