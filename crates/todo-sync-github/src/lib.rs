//! GitHub REST implementation of the `IssueTracker` seam.
//!
//! Wraps issue listing (label filtered, Link-header paginated), issue
//! creation and edits, comments, and commit author lookups.

mod client;
pub mod transport;

pub use client::{GithubApiClient, GithubClientConfig};
