use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use todo_sync_core::{
    IssueEdit, IssueListQuery, IssuePage, IssueState, IssueStateFilter, IssueTracker, NewIssue,
    RepoRef, TodoRecord, TrackerIssue,
};

use crate::config::ReconcileConfig;

#[derive(Default)]
struct FakeState {
    issues: Vec<TrackerIssue>,
    list_queries: Vec<IssueListQuery>,
    created: Vec<NewIssue>,
    edits: Vec<(u64, IssueEdit)>,
    comments: Vec<(u64, String)>,
    author_lookups: Vec<String>,
    commit_authors: HashMap<String, Option<String>>,
    failing_list_page: Option<u32>,
    failing_create_titles: HashSet<String>,
    failing_edit_numbers: HashSet<u64>,
}

#[derive(Default)]
/// In-memory tracker recording every call.
pub(crate) struct FakeTracker {
    state: Mutex<FakeState>,
}

impl FakeTracker {
    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("fake tracker lock");
        f(&mut state)
    }

    pub(crate) fn seed_issues(&self, issues: impl IntoIterator<Item = TrackerIssue>) {
        self.with_state(|state| state.issues.extend(issues));
    }

    pub(crate) fn set_commit_author(&self, sha: &str, login: Option<&str>) {
        self.with_state(|state| {
            state
                .commit_authors
                .insert(sha.to_string(), login.map(ToOwned::to_owned));
        });
    }

    pub(crate) fn fail_list_page(&self, page: u32) {
        self.with_state(|state| state.failing_list_page = Some(page));
    }

    pub(crate) fn fail_create(&self, title: &str) {
        self.with_state(|state| {
            state.failing_create_titles.insert(title.to_string());
        });
    }

    pub(crate) fn fail_edit(&self, number: u64) {
        self.with_state(|state| {
            state.failing_edit_numbers.insert(number);
        });
    }

    pub(crate) fn list_queries(&self) -> Vec<IssueListQuery> {
        self.with_state(|state| state.list_queries.clone())
    }

    pub(crate) fn created(&self) -> Vec<NewIssue> {
        self.with_state(|state| state.created.clone())
    }

    pub(crate) fn edits(&self) -> Vec<(u64, IssueEdit)> {
        self.with_state(|state| state.edits.clone())
    }

    pub(crate) fn comments(&self) -> Vec<(u64, String)> {
        self.with_state(|state| state.comments.clone())
    }

    pub(crate) fn author_lookups(&self) -> Vec<String> {
        self.with_state(|state| state.author_lookups.clone())
    }

    pub(crate) fn issues(&self) -> Vec<TrackerIssue> {
        self.with_state(|state| state.issues.clone())
    }

    /// Creates, edits and comments issued so far.
    pub(crate) fn mutations(&self) -> usize {
        self.with_state(|state| state.created.len() + state.edits.len() + state.comments.len())
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn list_issues(&self, query: &IssueListQuery) -> Result<IssuePage> {
        self.with_state(|state| {
            state.list_queries.push(query.clone());
            if state.failing_list_page == Some(query.page) {
                bail!("listing page {} failed", query.page);
            }
            let matching = state
                .issues
                .iter()
                .filter(|issue| issue.has_label(&query.label))
                .filter(|issue| match query.state {
                    IssueStateFilter::All => true,
                    IssueStateFilter::Open => !issue.is_closed(),
                    IssueStateFilter::Closed => issue.is_closed(),
                })
                .cloned()
                .collect::<Vec<_>>();
            let per_page = query.per_page.max(1) as usize;
            let start = (query.page.saturating_sub(1) as usize) * per_page;
            let issues = matching
                .iter()
                .skip(start)
                .take(per_page)
                .cloned()
                .collect::<Vec<_>>();
            let next_page = (start + per_page < matching.len()).then_some(query.page + 1);
            Ok(IssuePage { issues, next_page })
        })
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackerIssue> {
        self.with_state(|state| {
            if state.failing_create_titles.contains(&issue.title) {
                bail!("create rejected for '{}'", issue.title);
            }
            state.created.push(issue.clone());
            let number = state
                .issues
                .iter()
                .map(|issue| issue.number)
                .max()
                .unwrap_or(0)
                + 1;
            let created = TrackerIssue {
                id: number * 1000,
                number,
                title: issue.title.clone(),
                state: IssueState::Open,
                labels: issue.labels.clone(),
            };
            state.issues.push(created.clone());
            Ok(created)
        })
    }

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<TrackerIssue> {
        self.with_state(|state| {
            if state.failing_edit_numbers.contains(&number) {
                bail!("edit rejected for #{number}");
            }
            state.edits.push((number, edit.clone()));
            let issue = state
                .issues
                .iter_mut()
                .find(|issue| issue.number == number)
                .ok_or_else(|| anyhow!("issue #{number} not found"))?;
            if let Some(new_state) = edit.state {
                issue.state = new_state;
            }
            Ok(issue.clone())
        })
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        self.with_state(|state| {
            state.comments.push((number, body.to_string()));
            Ok(())
        })
    }

    async fn commit_author(&self, sha: &str) -> Result<Option<String>> {
        self.with_state(|state| {
            state.author_lookups.push(sha.to_string());
            match state.commit_authors.get(sha) {
                Some(login) => Ok(login.clone()),
                None => bail!("commit {sha} not found"),
            }
        })
    }
}

pub(crate) fn tracker_issue(
    number: u64,
    title: &str,
    state: IssueState,
    labels: &[&str],
) -> TrackerIssue {
    TrackerIssue {
        id: number * 1000,
        number,
        title: title.to_string(),
        state,
        labels: labels.iter().map(|label| label.to_string()).collect(),
    }
}

pub(crate) fn todo(title: &str, file: &str, line: usize) -> TodoRecord {
    TodoRecord {
        title: title.to_string(),
        body: String::new(),
        file: file.to_string(),
        line,
        kind: "TODO".to_string(),
        ..TodoRecord::default()
    }
}

pub(crate) fn test_config() -> ReconcileConfig {
    let repo = RepoRef::parse("acme/widgets").expect("repo");
    let mut config = ReconcileConfig::new(repo.clone(), repo, "abc123");
    config.branch = "main".to_string();
    config
}
