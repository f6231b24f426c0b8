use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// One in-code annotation comment as produced by the extractor.
///
/// `title` is the matching key against tracker issues. Two comments with the
/// same title are treated as the same logical item.
pub struct TodoRecord {
    pub title: String,
    pub body: String,
    /// Path relative to the scan root, `/`-separated.
    pub file: String,
    /// 1-based line of the keyword line.
    pub line: usize,
    /// Parent issue number, 0 when the comment references none.
    pub parent_issue: u64,
    pub author: Option<String>,
    pub committer_email: Option<String>,
    pub commit_hash: Option<String>,
    /// Keyword as written in the source, e.g. `TODO` or `FIXME`.
    #[serde(rename = "type")]
    pub kind: String,
    pub category: Option<String>,
    pub estimate_hours: f64,
}

impl TodoRecord {
    /// Commit that introduced the TODO, if blame attributed one.
    pub fn blamed_commit(&self) -> Option<&str> {
        self.commit_hash
            .as_deref()
            .map(str::trim)
            .filter(|hash| !hash.is_empty())
    }
}

/// Reports the total number of lines of a scanned file.
///
/// Used to clamp the deep-link context window. Implementations return `None`
/// for files they never scanned.
pub trait SourceLines: Send + Sync {
    fn file_lines(&self, file: &str) -> Option<usize>;
}

impl SourceLines for HashMap<String, usize> {
    fn file_lines(&self, file: &str) -> Option<usize> {
        self.get(file).copied()
    }
}
