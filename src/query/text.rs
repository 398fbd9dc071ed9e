//! Query text cleanup and clause extraction.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Trailing `-- comment` on a line.
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--.*").unwrap());

/// `SELECT <fields> FROM`, case-insensitive, across the whole text.
static SELECT_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*SELECT\b(.*?)\sFROM\s").unwrap());

/// `FROM <resource>`.
static FROM_RESOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\sFROM\s+([^\s,;]+)").unwrap());

/// Strip `#` comment lines, trailing `--` comments and blank lines, then
/// collapse every whitespace run into a single space.
pub fn strip_comments(query: &str) -> String {
    let lines: Vec<String> = query
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| LINE_COMMENT.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    WHITESPACE.replace_all(&lines.join(" "), " ").into_owned()
}

/// Byte range of the select list (between `SELECT` and `FROM`).
pub fn select_span(query: &str) -> Option<std::ops::Range<usize>> {
    SELECT_CLAUSE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
}

/// Split a select list on top-level commas. Empty items (a trailing comma)
/// are dropped; whitespace-only items are kept so they can be reported.
pub fn split_select_list(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);

    items.into_iter().filter(|item| !item.is_empty()).collect()
}

/// The resource named after `FROM`.
pub fn from_resource(query: &str) -> Option<&str> {
    FROM_RESOURCE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
