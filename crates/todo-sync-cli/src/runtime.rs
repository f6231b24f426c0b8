use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use todo_sync_core::{
    append_action_output, branch_from_ref, IssueTracker, RepoRef, SourceLines,
    SCAN_COMPLETED_OUTPUT,
};
use todo_sync_engine::{
    normalize_source_root, ReconcileConfig, Reconciler, RunSummary, DEFAULT_LABEL,
};
use todo_sync_extractor::{Extraction, ExtractorConfig, TodoExtractor};
use todo_sync_github::{GithubApiClient, GithubClientConfig};
use url::Url;

use crate::cli_args::Cli;

/// Runs one scan: index managed issues, extract TODOs, reconcile, report.
pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    let reconcile_config = build_reconcile_config(&cli)?;
    log_effective_config(&cli, &reconcile_config);

    let client = GithubApiClient::new(build_client_config(&cli, &reconcile_config))?;
    let tracker: Arc<dyn IssueTracker> = Arc::new(client);
    let reconciler = Reconciler::new(tracker, reconcile_config);

    let index = reconciler.fetch_index().await?;

    let extractor = TodoExtractor::new(build_extractor_config(&cli))?;
    let Extraction { todos, file_lines } = extractor
        .extract()
        .await
        .context("failed to extract TODO comments")?;
    tracing::info!(count = todos.len(), "extracted TODO comments");
    let lines: Arc<dyn SourceLines> = Arc::new(file_lines);

    let summary = reconciler.reconcile(index, todos, lines).await?;
    if cli.summary_json {
        print_summary_json(&summary)?;
    }

    write_completion_marker(cli.output_path.as_deref());
    Ok(())
}

pub(crate) fn build_reconcile_config(cli: &Cli) -> Result<ReconcileConfig> {
    let code_repo = RepoRef::parse(&cli.repo).context("invalid --repo")?;
    let issue_repo = match cli
        .issue_repo
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        Some(raw) => RepoRef::parse(raw).context("invalid --issue-repo")?,
        None => code_repo.clone(),
    };
    let sha = cli.sha.trim();
    if sha.is_empty() {
        bail!("--sha cannot be empty");
    }
    let label = match cli.label.trim() {
        "" => DEFAULT_LABEL,
        label => label,
    };

    let mut config = ReconcileConfig::new(code_repo, issue_repo, sha);
    config.label = label.to_string();
    config.branch = branch_from_ref(&cli.git_ref);
    config.source_root = cli.root.clone();
    config.server_url = parse_server_url(&cli.server_url)?;
    config.per_page = cli.per_page;
    config.add_limit = cli.add_limit;
    config.close_limit = cli.close_limit;
    config.extended_labels = cli.extended_labels;
    config.close_on_same_branch = cli.close_on_same_branch;
    config.comment_on_close = cli.comment_on_issues;
    config.assign_from_blame = cli.assign_from_blame;
    config.dry_run = cli.dry_run;
    Ok(config)
}

pub(crate) fn build_client_config(cli: &Cli, config: &ReconcileConfig) -> GithubClientConfig {
    GithubClientConfig {
        api_base: cli.api_base.clone(),
        token: cli.token.clone(),
        issue_repo: config.issue_repo.clone(),
        code_repo: config.code_repo.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
    }
}

pub(crate) fn build_extractor_config(cli: &Cli) -> ExtractorConfig {
    let mut config = ExtractorConfig::new(scan_directory(&cli.workspace, &cli.root));
    config.include_patterns = cli.include_pattern.iter().cloned().collect();
    config.exclude_patterns = cli.exclude_pattern.iter().cloned().collect();
    config.min_words = cli.min_words;
    config.min_chars = cli.min_characters;
    config.blame = cli.assign_from_blame;
    config.concurrency = cli.concurrency;
    config
}

/// The source root resolved inside the workspace checkout.
pub(crate) fn scan_directory(workspace: &Path, root: &str) -> PathBuf {
    let root = normalize_source_root(root);
    if root.is_empty() {
        workspace.to_path_buf()
    } else {
        workspace.join(root)
    }
}

fn parse_server_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid --server-url '{raw}'"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        bail!("--server-url '{raw}' must be an http(s) base url");
    }
    Ok(url)
}

fn log_effective_config(cli: &Cli, config: &ReconcileConfig) {
    tracing::info!(
        repo = %config.code_repo,
        issue_repo = %config.issue_repo,
        sha = %config.sha,
        branch = %config.branch,
        root = %cli.root,
        workspace = %cli.workspace.display(),
        label = %config.label,
        add_limit = config.add_limit,
        close_limit = config.close_limit,
        extended_labels = config.extended_labels,
        close_on_same_branch = config.close_on_same_branch,
        comment_on_issues = config.comment_on_close,
        assign_from_blame = config.assign_from_blame,
        dry_run = config.dry_run,
        "starting todo sync"
    );
}

fn print_summary_json(summary: &RunSummary) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(summary).context("failed to render run summary")?;
    println!("{rendered}");
    Ok(())
}

/// Appends the completion marker; a missing path or failed write is logged only.
pub(crate) fn write_completion_marker(path: Option<&Path>) {
    let Some(path) = path.filter(|path| !path.as_os_str().is_empty()) else {
        tracing::info!("no action output path configured, skipping completion marker");
        return;
    };
    match append_action_output(path, SCAN_COMPLETED_OUTPUT) {
        Ok(()) => tracing::debug!(path = %path.display(), "wrote completion marker"),
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to write completion marker"
            );
        }
    }
}
