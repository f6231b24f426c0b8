use todo_sync_core::{SourceLines, TodoRecord};

use crate::config::{ReconcileConfig, CONTEXT_LINES_DOWN, CONTEXT_LINES_UP};

/// Strips leading `./` and `/` and any trailing `/` from the source root.
///
/// A root of `.` or `/` normalizes to the empty string.
pub fn normalize_source_root(root: &str) -> String {
    let mut root = root.trim();
    loop {
        if let Some(rest) = root.strip_prefix("./") {
            root = rest;
        } else if let Some(rest) = root.strip_prefix('/') {
            root = rest;
        } else {
            break;
        }
    }
    let root = root.trim_end_matches('/');
    if root == "." {
        String::new()
    } else {
        root.to_string()
    }
}

/// Non-empty path segments of `path`, in order. Segments are raw; percent
/// encoding happens when they are pushed onto the link url.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Line window `(start, end)` shown around a TODO.
///
/// The end is clamped to the file length only when the file is longer than
/// the start but shorter than the unclamped end.
pub fn context_window(line: usize, total_lines: Option<usize>) -> (usize, usize) {
    let start = line.saturating_sub(CONTEXT_LINES_UP);
    let mut end = line + CONTEXT_LINES_DOWN;
    if let Some(total) = total_lines {
        if start < total && total < end {
            end = total;
        }
    }
    (start, end)
}

/// Deep link to the TODO at the run's commit with its context window.
pub fn source_link(config: &ReconcileConfig, todo: &TodoRecord, lines: &dyn SourceLines) -> String {
    let (start, end) = context_window(todo.line, lines.file_lines(&todo.file));
    let root = normalize_source_root(&config.source_root);
    let path = if root.is_empty() {
        todo.file.clone()
    } else {
        format!("{root}/{}", todo.file)
    };

    let mut url = config.server_url.clone();
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments
                .pop_if_empty()
                .extend([
                    config.code_repo.owner.as_str(),
                    config.code_repo.name.as_str(),
                    "blob",
                    config.sha.as_str(),
                ])
                .extend(path_segments(&path));
        }
        Err(()) => {
            tracing::warn!(server_url = %config.server_url, "server url cannot carry a path");
        }
    }
    url.set_fragment(Some(&format!("L{start}-L{end}")));
    url.to_string()
}
