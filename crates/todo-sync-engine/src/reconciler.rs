use std::sync::Arc;

use todo_sync_core::{IssueTracker, SourceLines, TodoRecord};

use crate::assignment::{apply_assignments, resolve_assignees};
use crate::closure::reconcile_closures;
use crate::config::ReconcileConfig;
use crate::creation::reconcile_creations;
use crate::error::ReconcileError;
use crate::matcher::fetch_issue_index;
use crate::state::{IssueIndex, RunSummary};

/// Drives one reconciliation run against an issue tracker.
pub struct Reconciler {
    tracker: Arc<dyn IssueTracker>,
    config: Arc<ReconcileConfig>,
}

impl Reconciler {
    pub fn new(tracker: Arc<dyn IssueTracker>, config: ReconcileConfig) -> Self {
        Self {
            tracker,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Builds the title index of managed issues.
    pub async fn fetch_index(&self) -> Result<IssueIndex, ReconcileError> {
        fetch_issue_index(
            self.tracker.as_ref(),
            &self.config.label,
            self.config.per_page,
        )
        .await
    }

    /// Fetches the index and reconciles `todos` against it.
    pub async fn run(
        &self,
        todos: Vec<TodoRecord>,
        lines: Arc<dyn SourceLines>,
    ) -> Result<RunSummary, ReconcileError> {
        let index = self.fetch_index().await?;
        self.reconcile(index, todos, lines).await
    }

    /// Runs closure, creation and assignee resolution concurrently over a
    /// shared read-only index, then applies assignments once all three have
    /// finished.
    pub async fn reconcile(
        &self,
        index: IssueIndex,
        todos: Vec<TodoRecord>,
        lines: Arc<dyn SourceLines>,
    ) -> Result<RunSummary, ReconcileError> {
        let managed_issues = index.len();
        let index = Arc::new(index);
        let todos: Arc<[TodoRecord]> = todos.into();

        let closure = tokio::spawn({
            let tracker = Arc::clone(&self.tracker);
            let config = Arc::clone(&self.config);
            let index = Arc::clone(&index);
            let todos = Arc::clone(&todos);
            async move { reconcile_closures(tracker.as_ref(), &config, &index, &todos).await }
        });
        let creation = tokio::spawn({
            let tracker = Arc::clone(&self.tracker);
            let config = Arc::clone(&self.config);
            let index = Arc::clone(&index);
            let todos = Arc::clone(&todos);
            async move {
                reconcile_creations(tracker.as_ref(), &config, &index, &todos, lines.as_ref())
                    .await
            }
        });
        let assignment = self.config.assignment_enabled().then(|| {
            let tracker = Arc::clone(&self.tracker);
            let index = Arc::clone(&index);
            let todos = Arc::clone(&todos);
            tokio::spawn(async move { resolve_assignees(tracker.as_ref(), &index, &todos).await })
        });

        tracing::info!("waiting for issue management to complete");
        let (closure, creation, assignment) = tokio::join!(closure, creation, async {
            match assignment {
                Some(handle) => Some(handle.await),
                None => None,
            }
        });
        let closure_items = closure.map_err(|source| ReconcileError::Task {
            task: "closure",
            source,
        })?;
        let creation = creation.map_err(|source| ReconcileError::Task {
            task: "creation",
            source,
        })?;
        let resolution = assignment
            .transpose()
            .map_err(|source| ReconcileError::Task {
                task: "assignment",
                source,
            })?;

        let mut items = creation.items;
        items.extend(closure_items);
        if let Some(resolution) = resolution {
            items.extend(resolution.items);
            if creation.created.is_empty() {
                tracing::debug!("no issues created, skipping assignment");
            } else {
                items.extend(
                    apply_assignments(
                        self.tracker.as_ref(),
                        &resolution.assignees,
                        &creation.created,
                    )
                    .await,
                );
            }
        }

        let summary = RunSummary::new(self.config.dry_run, managed_issues, creation.todos, items);
        tracing::info!(
            dry_run = summary.dry_run,
            managed_issues = summary.managed_issues,
            todos = summary.todos_found,
            matched = summary.matched,
            created = summary.created,
            closed = summary.closed,
            assigned = summary.assigned,
            skipped = summary.skipped,
            failed = summary.failed,
            "reconciliation finished"
        );
        Ok(summary)
    }
}
