//! Source-tree TODO comment extractor.
//!
//! Walks a checkout, groups comment lines into blocks per language syntax,
//! parses keyword-led blocks into `TodoRecord`s and optionally attributes
//! them with `git blame`.

mod blame;
mod comment;
mod parse;
mod scanner;

pub use blame::{parse_line_porcelain, BlameInfo};
pub use comment::{collect_comment_blocks, comment_syntax_for, CommentLine, CommentSyntax};
pub use parse::{parse_estimate_hours, parse_todo_block, ParsedTodo, TODO_KEYWORDS};
pub use scanner::{ExtractError, Extraction, ExtractorConfig, TodoExtractor};
