use std::path::PathBuf;

use clap::{ArgAction, Parser};

const DEFAULT_MIN_WORDS: usize = 3;
const DEFAULT_MIN_CHARACTERS: usize = 30;
const DEFAULT_CONCURRENCY: usize = 128;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

/// Integer action input. Blank or unparsable values, including unset inputs
/// exported as empty strings, read as `default`.
fn input_count_or(
    default: usize,
) -> impl Fn(&str) -> Result<usize, String> + Clone + Send + Sync {
    move |value: &str| Ok(value.trim().parse::<usize>().unwrap_or(default))
}

/// Like [`input_count_or`], but an explicit zero is rejected.
fn positive_input_count_or(
    default: usize,
) -> impl Fn(&str) -> Result<usize, String> + Clone + Send + Sync {
    move |value: &str| match value.trim().parse::<usize>() {
        Ok(0) => Err("value must be greater than 0".to_string()),
        Ok(parsed) => Ok(parsed),
        Err(_) => Ok(default),
    }
}

/// Action inputs are truthy for `1`, `true`, `y` or `yes` in any case; any
/// other value reads as false.
fn parse_input_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "y" | "yes"
    ))
}

#[derive(Debug, Parser)]
#[command(
    name = "todo-sync",
    about = "Keeps tracker issues in sync with TODO comments in a source tree",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        env = "INPUT_REPO",
        help = "Repository holding the scanned code, as owner/repo"
    )]
    pub repo: String,

    #[arg(
        long = "issue-repo",
        env = "INPUT_ISSUE_REPO",
        help = "Repository holding the managed issues (defaults to --repo)"
    )]
    pub issue_repo: Option<String>,

    #[arg(long, env = "INPUT_SHA", help = "Commit the scan runs against")]
    pub sha: String,

    #[arg(
        long = "ref",
        env = "INPUT_REF",
        default_value = "",
        help = "Git ref of the run, e.g. refs/heads/main"
    )]
    pub git_ref: String,

    #[arg(
        long,
        env = "INPUT_ROOT",
        default_value = ".",
        help = "Source root relative to the workspace; also the deep-link path prefix"
    )]
    pub root: String,

    #[arg(
        long,
        env = "GITHUB_WORKSPACE",
        default_value = ".",
        help = "Checkout directory containing the source root"
    )]
    pub workspace: PathBuf,

    #[arg(
        long,
        env = "INPUT_LABEL",
        default_value = "todo",
        help = "Sentinel label scoping managed issues"
    )]
    pub label: String,

    #[arg(
        long,
        env = "INPUT_TOKEN",
        hide_env_values = true,
        help = "Tracker API token"
    )]
    pub token: String,

    #[arg(
        long = "include-pattern",
        env = "INPUT_INCLUDE_PATTERN",
        help = "Only scan relative paths matching this regex"
    )]
    pub include_pattern: Option<String>,

    #[arg(
        long = "exclude-pattern",
        env = "INPUT_EXCLUDE_PATTERN",
        help = "Skip relative paths matching this regex"
    )]
    pub exclude_pattern: Option<String>,

    #[arg(
        long = "min-words",
        env = "INPUT_MIN_WORDS",
        default_value_t = DEFAULT_MIN_WORDS,
        value_parser = input_count_or(DEFAULT_MIN_WORDS),
        help = "Minimum words in a TODO title and body"
    )]
    pub min_words: usize,

    #[arg(
        long = "min-characters",
        env = "INPUT_MIN_CHARACTERS",
        default_value_t = DEFAULT_MIN_CHARACTERS,
        value_parser = input_count_or(DEFAULT_MIN_CHARACTERS),
        help = "Minimum characters in a TODO title and body"
    )]
    pub min_characters: usize,

    #[arg(
        long = "add-limit",
        env = "INPUT_ADD_LIMIT",
        default_value_t = 0,
        value_parser = input_count_or(0),
        help = "Maximum issues to create per run (0 = unlimited)"
    )]
    pub add_limit: usize,

    #[arg(
        long = "close-limit",
        env = "INPUT_CLOSE_LIMIT",
        default_value_t = 0,
        value_parser = input_count_or(0),
        help = "Maximum issues to close per run (0 = unlimited)"
    )]
    pub close_limit: usize,

    #[arg(
        long,
        env = "INPUT_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = positive_input_count_or(DEFAULT_CONCURRENCY),
        help = "Files scanned concurrently"
    )]
    pub concurrency: usize,

    #[arg(
        long = "close-on-same-branch",
        env = "INPUT_CLOSE_ON_SAME_BRANCH",
        default_value = "false",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_input_flag,
        help = "Only close issues whose branch label matches the current branch"
    )]
    pub close_on_same_branch: bool,

    #[arg(
        long = "extended-labels",
        env = "INPUT_EXTENDED_LABELS",
        default_value = "false",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_input_flag,
        help = "Add branch, type, area, lang and estimate labels to new issues"
    )]
    pub extended_labels: bool,

    #[arg(
        long = "dry-run",
        env = "INPUT_DRY_RUN",
        default_value = "false",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_input_flag,
        help = "Log intended changes without touching the tracker"
    )]
    pub dry_run: bool,

    #[arg(
        long = "comment-on-issues",
        env = "INPUT_COMMENT_ON_ISSUES",
        default_value = "false",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_input_flag,
        help = "Comment with the closing commit before closing an issue"
    )]
    pub comment_on_issues: bool,

    #[arg(
        long = "assign-from-blame",
        env = "INPUT_ASSIGN_FROM_BLAME",
        default_value = "false",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_input_flag,
        help = "Assign new issues to the author of the commit that introduced the TODO"
    )]
    pub assign_from_blame: bool,

    #[arg(
        long = "api-base",
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        help = "Base URL of the tracker REST API"
    )]
    pub api_base: String,

    #[arg(
        long = "server-url",
        env = "GITHUB_SERVER_URL",
        default_value = "https://github.com",
        help = "Web host used for source deep links"
    )]
    pub server_url: String,

    #[arg(
        long = "per-page",
        default_value_t = 200,
        value_parser = parse_positive_u32,
        help = "Issues requested per listing page"
    )]
    pub per_page: u32,

    #[arg(
        long = "request-timeout-ms",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each tracker request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Attempts per tracker request (1 disables retries)"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        default_value_t = 500,
        help = "Base backoff between retried tracker requests"
    )]
    pub retry_base_delay_ms: u64,

    #[arg(
        long = "output-path",
        env = "GITHUB_OUTPUT",
        help = "Action output file receiving the completion marker"
    )]
    pub output_path: Option<PathBuf>,

    #[arg(
        long = "summary-json",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Print the run summary as JSON to stdout"
    )]
    pub summary_json: bool,
}
