use std::{fs, path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use todo_sync_core::{
    IssueEdit, IssueListQuery, IssuePage, IssueState, IssueTracker, NewIssue, RepoRef,
    SourceLines, TrackerIssue,
};
use todo_sync_engine::{ReconcileConfig, Reconciler, RunSummary};
use todo_sync_extractor::{ExtractorConfig, TodoExtractor};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Default)]
struct RecordingTracker {
    issues: AsyncMutex<Vec<TrackerIssue>>,
    writes: AsyncMutex<Vec<String>>,
}

impl RecordingTracker {
    async fn write_count(&self) -> usize {
        self.writes.lock().await.len()
    }

    async fn issue(&self, title: &str) -> Option<TrackerIssue> {
        self.issues
            .lock()
            .await
            .iter()
            .find(|issue| issue.title == title)
            .cloned()
    }
}

#[async_trait]
impl IssueTracker for RecordingTracker {
    async fn list_issues(&self, query: &IssueListQuery) -> Result<IssuePage> {
        let issues = self.issues.lock().await;
        let per_page = query.per_page as usize;
        let start = (query.page as usize - 1) * per_page;
        let page = issues
            .iter()
            .filter(|issue| issue.has_label(&query.label))
            .skip(start)
            .take(per_page)
            .cloned()
            .collect::<Vec<_>>();
        let next_page = (start + per_page < issues.len()).then_some(query.page + 1);
        Ok(IssuePage {
            issues: page,
            next_page,
        })
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackerIssue> {
        self.writes
            .lock()
            .await
            .push(format!("create {}", issue.title));
        let mut issues = self.issues.lock().await;
        let number = issues.len() as u64 + 1;
        let created = TrackerIssue {
            id: number,
            number,
            title: issue.title.clone(),
            state: IssueState::Open,
            labels: issue.labels.clone(),
        };
        issues.push(created.clone());
        Ok(created)
    }

    async fn edit_issue(&self, number: u64, edit: &IssueEdit) -> Result<TrackerIssue> {
        self.writes.lock().await.push(format!("edit #{number}"));
        let mut issues = self.issues.lock().await;
        let issue = issues
            .iter_mut()
            .find(|issue| issue.number == number)
            .ok_or_else(|| anyhow!("issue #{number} not found"))?;
        if let Some(state) = edit.state {
            issue.state = state;
        }
        Ok(issue.clone())
    }

    async fn create_comment(&self, number: u64, _body: &str) -> Result<()> {
        self.writes.lock().await.push(format!("comment #{number}"));
        Ok(())
    }

    async fn commit_author(&self, sha: &str) -> Result<Option<String>> {
        Err(anyhow!("unexpected commit lookup for {sha}"))
    }
}

fn write_source(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, contents).expect("write source");
}

fn run_config() -> ReconcileConfig {
    let repo = RepoRef::parse("acme/widgets").expect("repo");
    let mut config = ReconcileConfig::new(repo.clone(), repo, "abc123");
    config.branch = "main".to_string();
    config.extended_labels = true;
    config.per_page = 2;
    config
}

async fn scan_and_reconcile(tracker: &Arc<RecordingTracker>, root: &Path) -> RunSummary {
    let extraction = TodoExtractor::new(ExtractorConfig::new(root))
        .expect("extractor")
        .extract()
        .await
        .expect("extract");
    let todos = extraction.todos.clone();
    let lines: Arc<dyn SourceLines> = Arc::new(extraction);
    let dyn_tracker: Arc<dyn IssueTracker> = tracker.clone();
    Reconciler::new(dyn_tracker, run_config())
        .run(todos, lines)
        .await
        .expect("reconcile")
}

#[tokio::test]
async fn integration_todo_lifecycle_opens_closes_and_settles() {
    let workspace = tempfile::tempdir().expect("tempdir");
    write_source(
        workspace.path(),
        "src/cache.rs",
        "// TODO(storage): evict stale cache entries on startup\n// estimate: 90m\nfn cache() {}\n",
    );
    write_source(
        workspace.path(),
        "scripts/deploy.sh",
        "#!/bin/sh\n# FIXME: stop hardcoding the deploy region here\n",
    );
    write_source(
        workspace.path(),
        "src/http.rs",
        "fn serve() {}\n// HACK: bypass the proxy for local health checks\n",
    );
    let tracker = Arc::new(RecordingTracker::default());

    let first = scan_and_reconcile(&tracker, workspace.path()).await;
    assert_eq!(first.created, 3);
    assert_eq!(first.closed, 0);
    let cache_issue = tracker
        .issue("evict stale cache entries on startup")
        .await
        .expect("cache issue");
    assert_eq!(
        cache_issue.labels,
        vec![
            "todo",
            "branch: main",
            "type: todo",
            "area: storage",
            "lang: rs",
            "estimate: 1.5h"
        ]
    );

    write_source(workspace.path(), "scripts/deploy.sh", "#!/bin/sh\necho deploy\n");
    let second = scan_and_reconcile(&tracker, workspace.path()).await;
    assert_eq!(second.created, 0);
    assert_eq!(second.closed, 1);
    assert_eq!(second.matched, 2);
    let closed = tracker
        .issue("stop hardcoding the deploy region here")
        .await
        .expect("deploy issue");
    assert_eq!(closed.state, IssueState::Closed);

    let writes_before = tracker.write_count().await;
    let third = scan_and_reconcile(&tracker, workspace.path()).await;
    assert_eq!(third.mutations(), 0);
    assert_eq!(tracker.write_count().await, writes_before);
}

#[tokio::test]
async fn integration_reintroduced_todo_matches_closed_issue() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let comment = "// TODO: reconnect the metrics exporter after failover\n";
    write_source(workspace.path(), "src/metrics.rs", comment);
    let tracker = Arc::new(RecordingTracker::default());

    scan_and_reconcile(&tracker, workspace.path()).await;
    write_source(workspace.path(), "src/metrics.rs", "fn export() {}\n");
    scan_and_reconcile(&tracker, workspace.path()).await;
    write_source(workspace.path(), "src/metrics.rs", comment);
    let writes_before = tracker.write_count().await;

    let summary = scan_and_reconcile(&tracker, workspace.path()).await;

    assert_eq!(summary.matched, 1);
    assert_eq!(summary.created, 0);
    assert_eq!(tracker.write_count().await, writes_before);
}
