use std::sync::OnceLock;

use regex::Regex;

use crate::comment::CommentLine;

pub const TODO_KEYWORDS: &[&str] = &["TODO", "FIXME", "BUG", "HACK"];

const HOURS_PER_DAY: f64 = 8.0;
const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
/// TODO fields read from a comment block, before attribution.
pub struct ParsedTodo {
    pub kind: String,
    pub title: String,
    pub body: String,
    pub line: usize,
    pub parent_issue: u64,
    pub author: Option<String>,
    pub category: Option<String>,
    pub estimate_hours: f64,
}

fn keyword_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<kw>[A-Za-z]+)\b\s*(?:\((?P<paren>[^)]*)\))?\s*(?P<colon>:)?\s*(?P<title>.*)$")
            .expect("valid keyword regex")
    })
}

fn metadata_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<key>issue|estimate|category|author)\s*:\s*(?P<value>\S.*)$")
            .expect("valid metadata regex")
    })
}

fn estimate_part_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?P<amount>\d+(?:\.\d+)?)\s*(?P<unit>[dhm]?)")
            .expect("valid estimate regex")
    })
}

/// Parses every keyword-led TODO in one comment block.
///
/// Lines before the first keyword line are ignored; each keyword line starts
/// a new TODO and the following lines form its body.
pub fn parse_todo_block(lines: &[CommentLine]) -> Vec<ParsedTodo> {
    let mut todos = Vec::new();
    let mut current: Option<(ParsedTodo, Vec<String>)> = None;

    for comment in lines {
        if let Some(todo) = parse_keyword_line(comment) {
            if let Some((done, body)) = current.take() {
                todos.push(finish(done, body));
            }
            current = Some((todo, Vec::new()));
            continue;
        }
        let Some((todo, body)) = current.as_mut() else {
            continue;
        };
        if !apply_metadata(todo, &comment.text) {
            body.push(comment.text.clone());
        }
    }

    if let Some((done, body)) = current.take() {
        todos.push(finish(done, body));
    }
    todos
}

/// Parses `30m`, `1.5h`, `2h30m`, `1d` (8h) or a bare number of hours.
pub fn parse_estimate_hours(raw: &str) -> Option<f64> {
    let compact = raw.trim();
    if compact.is_empty() {
        return None;
    }
    let mut hours = 0.0;
    let mut consumed = 0;
    for captures in estimate_part_re().captures_iter(compact) {
        let whole = captures.get(0)?;
        if !compact[consumed..whole.start()].trim().is_empty() {
            return None;
        }
        consumed = whole.end();
        let amount = captures["amount"].parse::<f64>().ok()?;
        hours += match captures["unit"].to_ascii_lowercase().as_str() {
            "d" => amount * HOURS_PER_DAY,
            "m" => amount / MINUTES_PER_HOUR,
            _ => amount,
        };
    }
    if consumed == 0 || !compact[consumed..].trim().is_empty() {
        return None;
    }
    Some(hours)
}

fn parse_keyword_line(comment: &CommentLine) -> Option<ParsedTodo> {
    let captures = keyword_line_re().captures(comment.text.trim())?;
    let keyword = &captures["kw"];
    let upper = keyword.to_ascii_uppercase();
    if !TODO_KEYWORDS.contains(&upper.as_str()) {
        return None;
    }
    let paren = captures.name("paren").map(|value| value.as_str().trim());
    let has_separator = paren.is_some() || captures.name("colon").is_some();
    if keyword != upper && !has_separator {
        return None;
    }
    let title = captures["title"].trim().to_string();
    if title.is_empty() {
        return None;
    }

    let mut todo = ParsedTodo {
        kind: upper,
        title,
        body: String::new(),
        line: comment.line,
        parent_issue: 0,
        author: None,
        category: None,
        estimate_hours: 0.0,
    };
    match paren.filter(|value| !value.is_empty()) {
        Some(value) if value.starts_with('@') => {
            todo.author = Some(value.trim_start_matches('@').to_string());
        }
        Some(value) => todo.category = Some(value.to_string()),
        None => {}
    }
    Some(todo)
}

fn apply_metadata(todo: &mut ParsedTodo, text: &str) -> bool {
    let Some(captures) = metadata_line_re().captures(text.trim()) else {
        return false;
    };
    let value = captures["value"].trim();
    match captures["key"].to_ascii_lowercase().as_str() {
        "issue" => match value.trim_start_matches('#').parse::<u64>() {
            Ok(number) => todo.parent_issue = number,
            Err(_) => return false,
        },
        "estimate" => match parse_estimate_hours(value) {
            Some(hours) => todo.estimate_hours = hours,
            None => return false,
        },
        "category" => todo.category = Some(value.to_string()),
        "author" => todo.author = Some(value.trim_start_matches('@').to_string()),
        _ => return false,
    }
    true
}

fn finish(mut todo: ParsedTodo, body: Vec<String>) -> ParsedTodo {
    let start = body
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(body.len());
    let end = body
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |index| index + 1);
    todo.body = body[start..end.max(start)].join("\n");
    todo
}
