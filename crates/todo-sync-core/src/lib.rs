//! Shared data model and collaborator seams for the todo-sync reconciler.
//!
//! Provides the TODO and tracker issue records, the `IssueTracker` and
//! `SourceLines` traits consumed by the engine, repository identity parsing,
//! and the action-output marker writer used by the binary.

pub mod action_output;
pub mod repo;
pub mod todo;
pub mod tracker;

pub use action_output::{append_action_output, SCAN_COMPLETED_OUTPUT};
pub use repo::{branch_from_ref, RepoRef};
pub use todo::{SourceLines, TodoRecord};
pub use tracker::{
    issue_has_label, normalize_label, IssueEdit, IssueListQuery, IssuePage, IssueState,
    IssueStateFilter, IssueTracker, NewIssue, TrackerIssue,
};
