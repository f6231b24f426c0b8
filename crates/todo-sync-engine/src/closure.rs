use std::collections::HashSet;

use todo_sync_core::{IssueEdit, IssueTracker, TodoRecord, TrackerIssue};

use crate::config::ReconcileConfig;
use crate::labels::BRANCH_LABEL_PREFIX;
use crate::state::{IssueIndex, ItemAction, ItemOutcome, ItemReport};

/// Branch guard for closing `issue` from a run on `branch`.
///
/// With the guard enabled, an issue carrying branch labels may only be closed
/// from one of those branches; issues without branch labels are always
/// closable.
pub fn can_close_issue(issue: &TrackerIssue, branch: &str, close_on_same_branch: bool) -> bool {
    if !close_on_same_branch {
        return true;
    }
    let mut any_branch = false;
    for label in &issue.labels {
        let Some(label_branch) = label.strip_prefix(BRANCH_LABEL_PREFIX) else {
            continue;
        };
        if label_branch == branch {
            return true;
        }
        any_branch = true;
        tracing::debug!(
            issue = issue.number,
            label_branch = %label_branch,
            branch = %branch,
            "branch label does not match"
        );
    }
    !any_branch
}

/// Comment posted before closing: the bare sha when code and issues share a
/// repository, else `owner/repo@sha`.
pub fn close_comment_body(config: &ReconcileConfig) -> String {
    if config.same_repository() {
        format!("Closed in commit {}", config.sha)
    } else {
        format!("Closed in commit {}@{}", config.code_repo, config.sha)
    }
}

/// Closes open managed issues whose title no longer appears among the TODOs.
///
/// Issues are visited in issue-number order. Failed closes are recorded and do
/// not count toward the close limit.
pub async fn reconcile_closures(
    tracker: &dyn IssueTracker,
    config: &ReconcileConfig,
    index: &IssueIndex,
    todos: &[TodoRecord],
) -> Vec<ItemReport> {
    let live_titles = todos
        .iter()
        .map(|todo| todo.title.as_str())
        .collect::<HashSet<_>>();
    let mut items = Vec::new();
    let mut count = 0usize;

    for issue in index.issues_by_number() {
        if live_titles.contains(issue.title.as_str()) {
            continue;
        }
        if issue.is_closed() {
            tracing::debug!(issue = issue.number, "issue is already closed");
            continue;
        }
        if !can_close_issue(issue, &config.branch, config.close_on_same_branch) {
            tracing::info!(
                issue = issue.number,
                branch = %config.branch,
                "cannot close the issue from this branch"
            );
            items.push(report(
                issue,
                ItemAction::Close,
                ItemOutcome::skipped("branch label mismatch"),
            ));
            continue;
        }

        tracing::info!(issue = issue.number, title = %issue.title, "about to close an issue");
        if config.dry_run {
            tracing::info!(issue = issue.number, "dry run, issue not closed");
            items.push(report(issue, ItemAction::Close, ItemOutcome::skipped("dry run")));
            continue;
        }

        if config.comment_on_close {
            let outcome = match tracker
                .create_comment(issue.number, &close_comment_body(config))
                .await
            {
                Ok(()) => {
                    tracing::info!(issue = issue.number, "added a comment to the issue");
                    ItemOutcome::Applied
                }
                Err(error) => {
                    tracing::warn!(
                        issue = issue.number,
                        error = %error,
                        "failed to comment on the issue"
                    );
                    ItemOutcome::failed(&error)
                }
            };
            items.push(report(issue, ItemAction::Comment, outcome));
        }

        match tracker.edit_issue(issue.number, &IssueEdit::close()).await {
            Ok(_) => {
                tracing::info!(issue = issue.number, "closed an issue");
                items.push(report(issue, ItemAction::Close, ItemOutcome::Applied));
                count += 1;
                if config.close_limit > 0 && count >= config.close_limit {
                    tracing::info!(limit = config.close_limit, "reached limit of issues to close");
                    break;
                }
            }
            Err(error) => {
                tracing::warn!(issue = issue.number, error = %error, "failed to close an issue");
                items.push(report(issue, ItemAction::Close, ItemOutcome::failed(&error)));
            }
        }
    }

    tracing::info!(count, "closed issues");
    items
}

fn report(issue: &TrackerIssue, action: ItemAction, outcome: ItemOutcome) -> ItemReport {
    ItemReport::new(action, &issue.title, Some(issue.number), outcome)
}
