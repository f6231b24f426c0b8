use std::collections::{BTreeMap, HashMap};

use todo_sync_core::{IssueEdit, IssueTracker, TodoRecord, TrackerIssue};

use crate::state::{IssueIndex, ItemAction, ItemOutcome, ItemReport};

#[derive(Debug, Clone, Default)]
/// Assignees resolved for unmatched TODOs from their commit authors.
pub struct AssignmentResolution {
    /// Title to login, ordered by title.
    pub assignees: BTreeMap<String, String>,
    /// Commit hash to login, filled once per successfully resolved commit.
    pub commit_authors: HashMap<String, String>,
    /// Number of unmatched TODOs considered.
    pub candidates: usize,
    pub items: Vec<ItemReport>,
}

/// Looks up the commit author of every unmatched TODO that carries a commit
/// hash. Lookup failures are recorded and never abort the pass.
pub async fn resolve_assignees(
    tracker: &dyn IssueTracker,
    index: &IssueIndex,
    todos: &[TodoRecord],
) -> AssignmentResolution {
    let mut resolution = AssignmentResolution::default();

    for todo in todos {
        if index.contains(&todo.title) {
            continue;
        }
        resolution.candidates += 1;
        let Some(hash) = todo.blamed_commit() else {
            continue;
        };
        if let Some(login) = resolution.commit_authors.get(hash) {
            tracing::debug!(commit = %hash, login = %login, "using cached commit author");
            resolution
                .assignees
                .insert(todo.title.clone(), login.clone());
            continue;
        }
        match tracker.commit_author(hash).await {
            Ok(Some(login)) => {
                tracing::info!(
                    commit = %hash,
                    login = %login,
                    title = %todo.title,
                    "resolved commit author"
                );
                resolution
                    .commit_authors
                    .insert(hash.to_string(), login.clone());
                resolution.assignees.insert(todo.title.clone(), login);
            }
            Ok(None) => {
                tracing::warn!(commit = %hash, "commit has no author login");
                resolution.items.push(ItemReport::new(
                    ItemAction::ResolveAuthor,
                    &todo.title,
                    None,
                    ItemOutcome::skipped(format!("commit {hash} has no author login")),
                ));
            }
            Err(error) => {
                tracing::warn!(commit = %hash, error = %error, "failed to get commit author");
                resolution.items.push(ItemReport::new(
                    ItemAction::ResolveAuthor,
                    &todo.title,
                    None,
                    ItemOutcome::failed(&error),
                ));
            }
        }
    }

    tracing::info!(
        resolved = resolution.assignees.len(),
        candidates = resolution.candidates,
        "resolved assignees for new issues"
    );
    resolution
}

/// Assigns resolved authors to the issues created in this run.
///
/// Titles without a created issue are skipped.
pub async fn apply_assignments(
    tracker: &dyn IssueTracker,
    assignees: &BTreeMap<String, String>,
    created: &HashMap<String, TrackerIssue>,
) -> Vec<ItemReport> {
    tracing::info!(count = assignees.len(), "adding assignees to newly created issues");
    let mut items = Vec::new();
    for (title, login) in assignees {
        let Some(issue) = created.get(title) else {
            tracing::info!(title = %title, "skipping assignment for an issue that was not created");
            items.push(ItemReport::new(
                ItemAction::Assign,
                title,
                None,
                ItemOutcome::skipped("issue was not created"),
            ));
            continue;
        };
        let outcome = match tracker
            .edit_issue(issue.number, &IssueEdit::assign(login.clone()))
            .await
        {
            Ok(_) => {
                tracing::info!(issue = issue.number, login = %login, "assigned issue");
                ItemOutcome::Applied
            }
            Err(error) => {
                tracing::warn!(
                    issue = issue.number,
                    login = %login,
                    error = %error,
                    "failed to assign issue"
                );
                ItemOutcome::failed(&error)
            }
        };
        items.push(ItemReport::new(
            ItemAction::Assign,
            title,
            Some(issue.number),
            outcome,
        ));
    }
    items
}
