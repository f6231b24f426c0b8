use std::collections::{HashMap, HashSet};

use todo_sync_core::{IssueTracker, NewIssue, SourceLines, TodoRecord, TrackerIssue};

use crate::config::ReconcileConfig;
use crate::labels::issue_labels;
use crate::link::source_link;
use crate::state::{IssueIndex, ItemAction, ItemOutcome, ItemReport, TodoReport, TodoStatus};

#[derive(Debug, Clone, Default)]
pub struct CreationReport {
    /// Issues created this run, keyed by title.
    pub created: HashMap<String, TrackerIssue>,
    pub todos: Vec<TodoReport>,
    pub items: Vec<ItemReport>,
}

/// Renders the issue body for a TODO without a matching issue.
pub fn compose_issue_body(todo: &TodoRecord, link: &str) -> String {
    let mut body = format!("{}\n\n", todo.body);
    if todo.parent_issue > 0 {
        body.push_str(&format!("Parent issue: #{}\n", todo.parent_issue));
    }
    let author = todo.author.as_deref().filter(|author| !author.is_empty());
    let email = todo
        .committer_email
        .as_deref()
        .filter(|email| !email.is_empty());
    if let Some(author) = author {
        body.push_str(&format!("Author: @{author}\n"));
    } else if let Some(email) = email {
        body.push_str(&format!("Author: {email}\n"));
    }
    body.push_str(&format!("Line: {}\n{link}", todo.line));
    body
}

/// Opens one issue per unmatched TODO title, in TODO order.
///
/// Individual create failures are logged and recorded; they neither abort the
/// loop nor count toward the creation limit.
pub async fn reconcile_creations(
    tracker: &dyn IssueTracker,
    config: &ReconcileConfig,
    index: &IssueIndex,
    todos: &[TodoRecord],
    lines: &dyn SourceLines,
) -> CreationReport {
    let mut report = CreationReport::default();
    let mut seen = HashSet::new();
    let mut count = 0usize;
    let mut capped = false;

    for todo in todos {
        let status = if let Some(issue) = index.get(&todo.title) {
            TodoStatus::Matched {
                issue: issue.number,
            }
        } else if !seen.insert(todo.title.as_str()) {
            tracing::debug!(title = %todo.title, file = %todo.file, "duplicate todo title");
            TodoStatus::Duplicate
        } else if capped {
            report.items.push(ItemReport::new(
                ItemAction::Create,
                &todo.title,
                None,
                ItemOutcome::skipped("creation limit reached"),
            ));
            TodoStatus::Capped
        } else {
            let body = compose_issue_body(todo, &source_link(config, todo, lines));
            tracing::info!(
                title = %todo.title,
                file = %todo.file,
                line = todo.line,
                "about to create an issue"
            );
            if config.dry_run {
                tracing::info!(title = %todo.title, "dry run, issue not created");
                report.items.push(ItemReport::new(
                    ItemAction::Create,
                    &todo.title,
                    None,
                    ItemOutcome::skipped("dry run"),
                ));
                TodoStatus::DryRun
            } else {
                let request = NewIssue {
                    title: todo.title.clone(),
                    body,
                    labels: issue_labels(todo, config),
                };
                match tracker.create_issue(&request).await {
                    Ok(issue) => {
                        tracing::info!(
                            title = %todo.title,
                            issue = issue.number,
                            "created an issue"
                        );
                        let number = issue.number;
                        report.created.insert(todo.title.clone(), issue);
                        report.items.push(ItemReport::new(
                            ItemAction::Create,
                            &todo.title,
                            Some(number),
                            ItemOutcome::Applied,
                        ));
                        count += 1;
                        if config.add_limit > 0 && count >= config.add_limit {
                            tracing::info!(
                                limit = config.add_limit,
                                "reached limit of issues to create"
                            );
                            capped = true;
                        }
                        TodoStatus::Created { issue: number }
                    }
                    Err(error) => {
                        tracing::warn!(
                            title = %todo.title,
                            error = %error,
                            "failed to create an issue"
                        );
                        let outcome = ItemOutcome::failed(&error);
                        report.items.push(ItemReport::new(
                            ItemAction::Create,
                            &todo.title,
                            None,
                            outcome,
                        ));
                        TodoStatus::Failed {
                            cause: format!("{error:#}"),
                        }
                    }
                }
            }
        };
        report.todos.push(TodoReport {
            title: todo.title.clone(),
            file: todo.file.clone(),
            line: todo.line,
            status,
        });
    }

    tracing::info!(count, "created new issues");
    report
}
