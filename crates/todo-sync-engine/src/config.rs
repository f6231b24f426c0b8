use std::sync::OnceLock;

use todo_sync_core::RepoRef;
use url::Url;

pub const DEFAULT_LABEL: &str = "todo";
pub const DEFAULT_PER_PAGE: u32 = 200;
pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const CONTEXT_LINES_UP: usize = 3;
pub const CONTEXT_LINES_DOWN: usize = 7;

#[derive(Debug, Clone)]
/// Settings for one reconciliation run.
pub struct ReconcileConfig {
    /// Sentinel label scoping which issues are managed.
    pub label: String,
    pub code_repo: RepoRef,
    pub issue_repo: RepoRef,
    pub sha: String,
    pub branch: String,
    /// Source-root prefix joined in front of TODO paths in deep links.
    pub source_root: String,
    /// Web host used for deep links.
    pub server_url: Url,
    pub per_page: u32,
    /// Maximum issues created per run, 0 for unlimited.
    pub add_limit: usize,
    /// Maximum issues closed per run, 0 for unlimited.
    pub close_limit: usize,
    pub extended_labels: bool,
    pub close_on_same_branch: bool,
    pub comment_on_close: bool,
    pub assign_from_blame: bool,
    pub dry_run: bool,
}

impl ReconcileConfig {
    pub fn new(code_repo: RepoRef, issue_repo: RepoRef, sha: impl Into<String>) -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            code_repo,
            issue_repo,
            sha: sha.into(),
            branch: String::new(),
            source_root: String::new(),
            server_url: default_server_url(),
            per_page: DEFAULT_PER_PAGE,
            add_limit: 0,
            close_limit: 0,
            extended_labels: false,
            close_on_same_branch: false,
            comment_on_close: false,
            assign_from_blame: false,
            dry_run: false,
        }
    }

    /// Assignment resolution only runs for live runs with attribution enabled.
    pub fn assignment_enabled(&self) -> bool {
        self.assign_from_blame && !self.dry_run
    }

    pub fn same_repository(&self) -> bool {
        self.code_repo == self.issue_repo
    }
}

fn default_server_url() -> Url {
    static URL: OnceLock<Url> = OnceLock::new();
    URL.get_or_init(|| Url::parse(DEFAULT_SERVER_URL).expect("valid default server url"))
        .clone()
}
