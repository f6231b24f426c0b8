//! Reconciliation engine keeping tracker issues in agreement with in-code TODOs.
//!
//! The identity matcher indexes managed issues by title; the creation and
//! closure reconcilers and the assignment resolver run as independent tasks
//! over that index and the extracted TODOs; assignments are applied after all
//! of them have joined.

mod assignment;
mod closure;
mod config;
mod creation;
mod error;
mod labels;
mod link;
mod matcher;
mod reconciler;
mod state;
#[cfg(test)]
mod test_support;

pub use assignment::{apply_assignments, resolve_assignees, AssignmentResolution};
pub use closure::{can_close_issue, close_comment_body, reconcile_closures};
pub use config::{
    ReconcileConfig, CONTEXT_LINES_DOWN, CONTEXT_LINES_UP, DEFAULT_LABEL, DEFAULT_PER_PAGE,
    DEFAULT_SERVER_URL,
};
pub use creation::{compose_issue_body, reconcile_creations, CreationReport};
pub use error::ReconcileError;
pub use labels::{
    estimate_label, issue_labels, AREA_LABEL_PREFIX, BRANCH_LABEL_PREFIX, ESTIMATE_LABEL_PREFIX,
    LANG_LABEL_PREFIX, TYPE_LABEL_PREFIX,
};
pub use link::{context_window, normalize_source_root, path_segments, source_link};
pub use matcher::fetch_issue_index;
pub use reconciler::Reconciler;
pub use state::{
    IssueIndex, ItemAction, ItemOutcome, ItemReport, RunSummary, TodoReport, TodoStatus,
};
