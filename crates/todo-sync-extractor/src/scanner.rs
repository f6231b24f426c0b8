use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use regex::Regex;
use thiserror::Error;
use todo_sync_core::{SourceLines, TodoRecord};
use walkdir::{DirEntry, WalkDir};

use crate::blame::blame_line;
use crate::comment::{collect_comment_blocks, comment_syntax_for};
use crate::parse::{parse_todo_block, ParsedTodo};

pub const DEFAULT_MIN_WORDS: usize = 3;
pub const DEFAULT_MIN_CHARS: usize = 30;
pub const DEFAULT_SCAN_CONCURRENCY: usize = 128;

#[derive(Debug, Error)]
/// Enumerates failures that abort an extraction.
pub enum ExtractError {
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("source root '{}' is not a readable directory", root.display())]
    MissingRoot { root: PathBuf },
}

#[derive(Debug, Clone)]
/// Extractor settings.
pub struct ExtractorConfig {
    pub root: PathBuf,
    /// Relative paths must match one of these when any are given.
    pub include_patterns: Vec<String>,
    /// Relative paths matching any of these are skipped.
    pub exclude_patterns: Vec<String>,
    pub min_words: usize,
    pub min_chars: usize,
    pub blame: bool,
    pub concurrency: usize,
}

impl ExtractorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            min_words: DEFAULT_MIN_WORDS,
            min_chars: DEFAULT_MIN_CHARS,
            blame: false,
            concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// TODOs in walk order plus the line count of every scanned file.
pub struct Extraction {
    pub todos: Vec<TodoRecord>,
    pub file_lines: HashMap<String, usize>,
}

impl SourceLines for Extraction {
    fn file_lines(&self, file: &str) -> Option<usize> {
        self.file_lines.get(file).copied()
    }
}

#[derive(Debug)]
struct FileScan {
    file: String,
    line_count: usize,
    todos: Vec<TodoRecord>,
}

pub struct TodoExtractor {
    config: ExtractorConfig,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl TodoExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        let include = compile_patterns(&config.include_patterns)?;
        let exclude = compile_patterns(&config.exclude_patterns)?;
        Ok(Self {
            config,
            include,
            exclude,
        })
    }

    pub async fn extract(&self) -> Result<Extraction, ExtractError> {
        let files = self.discover_files()?;
        tracing::debug!(
            root = %self.config.root.display(),
            files = files.len(),
            "discovered source files"
        );

        let scans = stream::iter(files)
            .map(|file| self.scan_file(file))
            .buffered(self.config.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut extraction = Extraction::default();
        for scan in scans.into_iter().flatten() {
            extraction.todos.extend(scan.todos);
            extraction.file_lines.insert(scan.file, scan.line_count);
        }
        Ok(extraction)
    }

    fn discover_files(&self) -> Result<Vec<String>, ExtractError> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(ExtractError::MissingRoot { root: root.clone() });
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(error = %error, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = relative_path(root, entry.path()) else {
                continue;
            };
            if comment_syntax_for(&relative).is_none() || !self.is_selected(&relative) {
                continue;
            }
            files.push(relative);
        }
        Ok(files)
    }

    fn is_selected(&self, relative: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|re| re.is_match(relative));
        included && !self.exclude.iter().any(|re| re.is_match(relative))
    }

    async fn scan_file(&self, file: String) -> Option<FileScan> {
        let path = self.config.root.join(&file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(file = %file, error = %error, "skipping unreadable file");
                return None;
            }
        };
        let Ok(source) = String::from_utf8(bytes) else {
            tracing::debug!(file = %file, "skipping non-utf8 file");
            return None;
        };
        let syntax = comment_syntax_for(&file)?;

        let mut todos = Vec::new();
        for block in collect_comment_blocks(&source, syntax) {
            for parsed in parse_todo_block(&block) {
                if !self.qualifies(&parsed) {
                    continue;
                }
                todos.push(self.build_record(&file, parsed).await);
            }
        }

        Some(FileScan {
            line_count: source.lines().count(),
            file,
            todos,
        })
    }

    fn qualifies(&self, todo: &ParsedTodo) -> bool {
        let text = format!("{} {}", todo.title, todo.body);
        let text = text.trim();
        text.split_whitespace().count() >= self.config.min_words
            && text.chars().count() >= self.config.min_chars
    }

    async fn build_record(&self, file: &str, parsed: ParsedTodo) -> TodoRecord {
        let mut record = TodoRecord {
            title: parsed.title,
            body: parsed.body,
            file: file.to_string(),
            line: parsed.line,
            parent_issue: parsed.parent_issue,
            author: parsed.author,
            committer_email: None,
            commit_hash: None,
            kind: parsed.kind,
            category: parsed.category,
            estimate_hours: parsed.estimate_hours,
        };
        if self.config.blame {
            match blame_line(&self.config.root, file, record.line).await {
                Ok(info) => {
                    record.commit_hash = info.commit_hash;
                    record.committer_email = info.committer_email;
                }
                Err(error) => {
                    tracing::warn!(
                        file = %file,
                        line = record.line,
                        error = %error,
                        "blame attribution failed"
                    );
                }
            }
        }
        record
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ExtractError> {
    patterns
        .iter()
        .map(|pattern| pattern.trim())
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ExtractError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
