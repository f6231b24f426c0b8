const SLASH_LINE: &[&str] = &["//"];
const HASH_LINE: &[&str] = &["#"];
const DASH_LINE: &[&str] = &["--"];
const SEMICOLON_LINE: &[&str] = &[";"];
const C_BLOCK: (&str, &str) = ("/*", "*/");

const SLASH_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "cs", "go", "java", "js", "jsx", "mjs", "cjs", "ts",
    "tsx", "kt", "kts", "rs", "scala", "swift", "dart", "php", "groovy", "gradle", "m", "mm",
    "proto", "zig", "v", "sol",
];
const HASH_EXTENSIONS: &[&str] = &[
    "py", "rb", "sh", "bash", "zsh", "fish", "yml", "yaml", "toml", "pl", "pm", "r", "tf", "cmake",
    "ps1", "nim", "cr", "ex", "exs", "jl", "coffee", "dockerfile", "mk",
];
const DASH_EXTENSIONS: &[&str] = &["sql", "lua", "hs", "elm", "ada"];
const SEMICOLON_EXTENSIONS: &[&str] = &["clj", "cljs", "lisp", "el", "scm", "asm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Comment markers recognised for one language family.
pub struct CommentSyntax {
    pub line_markers: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Comment text with its 1-based source line.
pub struct CommentLine {
    pub line: usize,
    pub text: String,
}

/// Resolves comment syntax from the file extension (or well-known file name).
pub fn comment_syntax_for(file: &str) -> Option<CommentSyntax> {
    let name = file.rsplit('/').next().unwrap_or(file).to_ascii_lowercase();
    let extension = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension.to_string(),
        _ => name.clone(),
    };
    let extension = match extension.as_str() {
        "makefile" => "mk".to_string(),
        _ => extension,
    };
    let extension = extension.as_str();
    if SLASH_EXTENSIONS.contains(&extension) {
        return Some(CommentSyntax {
            line_markers: SLASH_LINE,
            block: Some(C_BLOCK),
        });
    }
    if HASH_EXTENSIONS.contains(&extension) {
        return Some(CommentSyntax {
            line_markers: HASH_LINE,
            block: None,
        });
    }
    if DASH_EXTENSIONS.contains(&extension) {
        return Some(CommentSyntax {
            line_markers: DASH_LINE,
            block: None,
        });
    }
    if SEMICOLON_EXTENSIONS.contains(&extension) {
        return Some(CommentSyntax {
            line_markers: SEMICOLON_LINE,
            block: None,
        });
    }
    None
}

/// Groups consecutive comment lines into blocks.
///
/// A run of whole-line comments forms one block; a `/* */` comment forms its
/// own block; a trailing comment after code is a single-line block.
pub fn collect_comment_blocks(source: &str, syntax: CommentSyntax) -> Vec<Vec<CommentLine>> {
    let mut blocks = Vec::new();
    let mut current: Vec<CommentLine> = Vec::new();
    let mut in_block_comment = false;

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw_line.trim();

        if in_block_comment {
            let (_, close) = syntax.block.unwrap_or(C_BLOCK);
            let (content, closed) = match trimmed.find(close) {
                Some(end) => (&trimmed[..end], true),
                None => (trimmed, false),
            };
            current.push(CommentLine {
                line,
                text: strip_block_decoration(content),
            });
            if closed {
                in_block_comment = false;
                flush(&mut blocks, &mut current);
            }
            continue;
        }

        if let Some((open, close)) = syntax.block {
            if let Some(rest) = trimmed.strip_prefix(open) {
                flush(&mut blocks, &mut current);
                match rest.find(close) {
                    Some(end) => {
                        current.push(CommentLine {
                            line,
                            text: strip_block_decoration(&rest[..end]),
                        });
                        flush(&mut blocks, &mut current);
                    }
                    None => {
                        current.push(CommentLine {
                            line,
                            text: strip_block_decoration(rest),
                        });
                        in_block_comment = true;
                    }
                }
                continue;
            }
        }

        if let Some(text) = strip_line_marker(trimmed, syntax.line_markers) {
            current.push(CommentLine { line, text });
            continue;
        }

        flush(&mut blocks, &mut current);
        if let Some(text) = trailing_comment(raw_line, syntax.line_markers) {
            blocks.push(vec![CommentLine { line, text }]);
        }
    }

    flush(&mut blocks, &mut current);
    blocks
}

fn flush(blocks: &mut Vec<Vec<CommentLine>>, current: &mut Vec<CommentLine>) {
    if !current.is_empty() {
        blocks.push(std::mem::take(current));
    }
}

fn strip_line_marker(trimmed: &str, markers: &[&str]) -> Option<String> {
    markers.iter().find_map(|marker| {
        let rest = trimmed.strip_prefix(marker)?;
        let marker_chars = marker.chars().collect::<Vec<_>>();
        let rest = rest.trim_start_matches(|ch: char| marker_chars.contains(&ch) || ch == '!');
        Some(rest.trim().to_string())
    })
}

fn trailing_comment(raw_line: &str, markers: &[&str]) -> Option<String> {
    markers.iter().find_map(|marker| {
        let needle = format!(" {marker} ");
        let start = raw_line.find(&needle)?;
        let text = raw_line[start + needle.len()..].trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn strip_block_decoration(content: &str) -> String {
    content
        .trim()
        .trim_start_matches('*')
        .trim_end_matches('*')
        .trim()
        .to_string()
}
