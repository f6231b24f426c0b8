use std::collections::HashMap;

use serde::Serialize;
use todo_sync_core::TrackerIssue;

#[derive(Debug, Clone, Default)]
/// Managed issues keyed by exact title.
///
/// When several issues share a title the open one wins; among equals the
/// first seen is kept.
pub struct IssueIndex {
    by_title: HashMap<String, TrackerIssue>,
}

impl IssueIndex {
    pub fn from_issues(issues: impl IntoIterator<Item = TrackerIssue>) -> Self {
        let mut index = Self::default();
        for issue in issues {
            index.insert(issue);
        }
        index
    }

    pub fn insert(&mut self, issue: TrackerIssue) {
        match self.by_title.get(&issue.title) {
            Some(existing) if !existing.is_closed() || issue.is_closed() => {
                tracing::debug!(
                    title = %issue.title,
                    kept = existing.number,
                    ignored = issue.number,
                    "duplicate issue title"
                );
            }
            _ => {
                self.by_title.insert(issue.title.clone(), issue);
            }
        }
    }

    pub fn get(&self, title: &str) -> Option<&TrackerIssue> {
        self.by_title.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    /// Indexed issues ordered by issue number.
    pub fn issues_by_number(&self) -> Vec<&TrackerIssue> {
        let mut issues = self.by_title.values().collect::<Vec<_>>();
        issues.sort_by_key(|issue| issue.number);
        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction {
    Create,
    Close,
    Comment,
    ResolveAuthor,
    Assign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
/// Result of one reconciliation step.
pub enum ItemOutcome {
    Applied,
    Skipped(String),
    Failed(String),
}

impl ItemOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    pub fn failed(error: &anyhow::Error) -> Self {
        Self::Failed(format!("{error:#}"))
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub action: ItemAction,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<u64>,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

impl ItemReport {
    pub fn new(
        action: ItemAction,
        title: impl Into<String>,
        issue: Option<u64>,
        outcome: ItemOutcome,
    ) -> Self {
        Self {
            action,
            title: title.into(),
            issue,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
/// Where a TODO ended up after one run.
pub enum TodoStatus {
    /// An issue with the same title already existed.
    Matched { issue: u64 },
    Created { issue: u64 },
    /// Left unmatched because the creation limit was reached.
    Capped,
    DryRun,
    /// Shares its title with an earlier TODO in the same run.
    Duplicate,
    Failed { cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoReport {
    pub title: String,
    pub file: String,
    pub line: usize,
    #[serde(flatten)]
    pub status: TodoStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Aggregated outcome of a reconciliation run.
pub struct RunSummary {
    pub dry_run: bool,
    pub managed_issues: usize,
    pub todos_found: usize,
    pub matched: usize,
    pub created: usize,
    pub closed: usize,
    pub commented: usize,
    pub assigned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub todos: Vec<TodoReport>,
    pub items: Vec<ItemReport>,
}

impl RunSummary {
    pub fn new(
        dry_run: bool,
        managed_issues: usize,
        todos: Vec<TodoReport>,
        items: Vec<ItemReport>,
    ) -> Self {
        let applied = |action: ItemAction| {
            items
                .iter()
                .filter(|item| item.action == action && item.outcome.is_applied())
                .count()
        };
        Self {
            dry_run,
            managed_issues,
            todos_found: todos.len(),
            matched: todos
                .iter()
                .filter(|todo| matches!(todo.status, TodoStatus::Matched { .. }))
                .count(),
            created: applied(ItemAction::Create),
            closed: applied(ItemAction::Close),
            commented: applied(ItemAction::Comment),
            assigned: applied(ItemAction::Assign),
            skipped: items
                .iter()
                .filter(|item| matches!(item.outcome, ItemOutcome::Skipped(_)))
                .count(),
            failed: items
                .iter()
                .filter(|item| matches!(item.outcome, ItemOutcome::Failed(_)))
                .count(),
            todos,
            items,
        }
    }

    /// Number of tracker writes performed.
    pub fn mutations(&self) -> usize {
        self.created + self.closed + self.commented + self.assigned
    }
}
