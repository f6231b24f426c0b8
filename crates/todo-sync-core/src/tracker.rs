use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Enumerates supported `IssueState` values.
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// State filter applied when listing issues.
pub enum IssueStateFilter {
    Open,
    Closed,
    All,
}

impl IssueStateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Tracker issue as mirrored by the reconciler.
pub struct TrackerIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl TrackerIssue {
    pub fn is_closed(&self) -> bool {
        self.state == IssueState::Closed
    }

    pub fn has_label(&self, label: &str) -> bool {
        issue_has_label(self.labels.iter().map(String::as_str), label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One page request against the label-filtered issue listing.
pub struct IssueListQuery {
    pub label: String,
    pub state: IssueStateFilter,
    pub per_page: u32,
    /// 1-based page number.
    pub page: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePage {
    pub issues: Vec<TrackerIssue>,
    /// Next page to request; `None` once the tracker reports no further page.
    pub next_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Partial issue update; `None` fields are left untouched.
pub struct IssueEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
}

impl IssueEdit {
    pub fn close() -> Self {
        Self {
            state: Some(IssueState::Closed),
            ..Self::default()
        }
    }

    pub fn assign(login: impl Into<String>) -> Self {
        Self {
            assignees: Some(vec![login.into()]),
            ..Self::default()
        }
    }
}

#[async_trait]
/// Trait contract for the issue tracker operations the reconciler relies on.
pub trait IssueTracker: Send + Sync {
    async fn list_issues(&self, query: &IssueListQuery) -> Result<IssuePage>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackerIssue>;

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<TrackerIssue>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<()>;

    /// Resolves the tracker login of a commit's author, `None` when the commit
    /// has no linked account.
    async fn commit_author(&self, sha: &str) -> Result<Option<String>>;
}

/// Normalize issue labels for case-insensitive matching.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Return true when any of `labels` equals `required` after normalization.
pub fn issue_has_label<'a>(labels: impl IntoIterator<Item = &'a str>, required: &str) -> bool {
    let required = normalize_label(required);
    if required.is_empty() {
        return false;
    }
    labels
        .into_iter()
        .map(normalize_label)
        .any(|label| label == required)
}
