use todo_sync_core::{IssueListQuery, IssueStateFilter, IssueTracker};

use crate::error::ReconcileError;
use crate::state::IssueIndex;

/// Lists every issue carrying `label`, open and closed, across all pages.
///
/// Any listing failure is fatal: reconciling against a partial index would
/// recreate issues that already exist.
pub async fn fetch_issue_index(
    tracker: &dyn IssueTracker,
    label: &str,
    per_page: u32,
) -> Result<IssueIndex, ReconcileError> {
    let mut index = IssueIndex::default();
    let mut page = 1;
    let mut listed = 0;
    loop {
        let query = IssueListQuery {
            label: label.to_string(),
            state: IssueStateFilter::All,
            per_page,
            page,
        };
        let result =
            tracker
                .list_issues(&query)
                .await
                .map_err(|source| ReconcileError::IssueListing {
                    label: label.to_string(),
                    page,
                    source,
                })?;
        listed += result.issues.len();
        for issue in result.issues {
            if !issue.has_label(label) {
                tracing::debug!(issue = issue.number, "ignoring issue without sentinel label");
                continue;
            }
            index.insert(issue);
        }
        match result.next_page {
            Some(next) if next > page => page = next,
            _ => break,
        }
    }
    tracing::info!(
        label = %label,
        pages = page,
        listed,
        indexed = index.len(),
        "indexed managed issues"
    );
    Ok(index)
}
