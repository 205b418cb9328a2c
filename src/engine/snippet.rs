//! Snippet group extraction.
//!
//! A snippet group is a named body of template text delimited by
//! `// START OF <KEY>` and `// END OF <KEY>` lines. Groups are the unit of
//! insertion for the merge engine; templates written as brand-new files have
//! the delimiters stripped instead.

use std::collections::BTreeMap;

use regex_lite::Regex;

fn start_re() -> Regex {
    Regex::new(r"^\s*//\s*START\s+OF\s+(.+?)\s*$").unwrap()
}

fn end_re() -> Regex {
    Regex::new(r"^\s*//\s*END\s+OF\s+(.+?)\s*$").unwrap()
}

/// Split content into lines, appending an empty string when the content ends
/// with a newline so that rejoining with `\n` round-trips.
pub fn split_lines_preserve(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = content.lines().map(|line| line.to_string()).collect();
    if content.ends_with('\n') {
        lines.push(String::new());
    }
    lines
}

/// Extract all snippet groups from `text`, keyed by the trimmed START key.
///
/// Nesting is not supported: a second START before an END restarts collection
/// for the new key and the unfinished group is discarded. An END line closes
/// the currently open group regardless of its key text. An unterminated
/// group at end of input is dropped.
pub fn extract(text: &str) -> BTreeMap<String, String> {
    let start = start_re();
    let end = end_re();

    let mut groups = BTreeMap::new();
    let mut open: Option<(String, Vec<String>)> = None;

    for line in text.lines() {
        if let Some(caps) = start.captures(line) {
            open = Some((caps[1].trim().to_string(), Vec::new()));
        } else if end.is_match(line) {
            if let Some((key, body)) = open.take() {
                groups.insert(key, body.join("\n"));
            }
        } else if let Some((_, body)) = open.as_mut() {
            body.push(line.to_string());
        }
    }

    groups
}

/// Remove START/END delimiter lines, keeping everything between them.
pub fn strip(text: &str) -> String {
    let start = start_re();
    let end = end_re();

    let lines = split_lines_preserve(text);
    let kept: Vec<&str> = lines
        .iter()
        .map(|l| l.as_str())
        .filter(|l| !start.is_match(l) && !end.is_match(l))
        .collect();
    kept.join("\n")
}

/// True when `line` opens or closes a snippet group.
pub fn is_delimiter_line(line: &str) -> bool {
    start_re().is_match(line) || end_re().is_match(line)
}
