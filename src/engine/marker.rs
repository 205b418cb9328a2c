//! Insertion-marker management.
//!
//! A marker is a single-line comment `// ADD <key> BELOW` (or `ABOVE`) in a
//! target file, telling the merge engine where the snippet for `<key>`
//! belongs. This module detects markers, installs them relative to located
//! targets or legacy fallback blocks, and heuristically places them in
//! hand-written files that predate the marker convention.

use regex_lite::Regex;

use crate::engine::locate::{self, Occurrence};
use crate::engine::snippet::split_lines_preserve;

/// Which side of the marker the snippet lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn word(self) -> &'static str {
        match self {
            Direction::Above => "ABOVE",
            Direction::Below => "BELOW",
        }
    }
}

fn marker_re() -> Regex {
    // Direction matches case-insensitively; the key is captured exactly.
    Regex::new(r"^\s*//\s*ADD\s+(.+?)\s+((?i:BELOW|ABOVE))\s*$").unwrap()
}

/// Parse a line as a marker, returning the exact key and direction.
pub fn parse_marker(line: &str) -> Option<(String, Direction)> {
    let caps = marker_re().captures(line)?;
    let key = caps[1].trim().to_string();
    let direction = if caps[2].eq_ignore_ascii_case("BELOW") {
        Direction::Below
    } else {
        Direction::Above
    };
    Some((key, direction))
}

/// Render a marker line with the given indentation.
pub fn marker_line(indent: &str, key: &str, direction: Direction) -> String {
    format!("{indent}// ADD {key} {}", direction.word())
}

/// True if any line of `text` is a marker for exactly `key`.
pub fn exists(text: &str, key: &str) -> bool {
    text.lines()
        .filter_map(parse_marker)
        .any(|(k, _)| k == key)
}

/// True if any line of `text` is a marker at all.
pub fn has_any(text: &str) -> bool {
    text.lines().any(|l| parse_marker(l).is_some())
}

/// Insert a marker immediately above or below the located target line,
/// inheriting its indentation. Returns `None` when the target is absent.
pub fn insert_relative_to_target(
    text: &str,
    key: &str,
    target: &str,
    direction: Direction,
    occurrence: Occurrence,
) -> Option<String> {
    let hit = locate::find_target(text, target, occurrence)?;
    let mut lines = split_lines_preserve(text);
    let marker = marker_line(&hit.indent, key, direction);
    let at = match direction {
        Direction::Above => hit.line,
        Direction::Below => hit.line + 1,
    };
    lines.insert(at.min(lines.len()), marker);
    Some(lines.join("\n"))
}

/// Install a marker for `key` after a legacy fallback block.
///
/// The block is located as a contiguous whitespace-normalized run of lines,
/// preferring the last occurrence. When the block is absent, the last line
/// mentioning the key's slug is used as the anchor; failing that too, the
/// marker is appended at end of file with the indentation of the last
/// non-blank line.
pub fn insert_after_fallback_block(text: &str, key: &str, fallback_body: &str) -> String {
    let mut lines = split_lines_preserve(text);
    let block: Vec<String> = fallback_body.lines().map(|l| l.to_string()).collect();
    let block_len = block.iter().filter(|l| !locate::normalize_ws(l).is_empty()).count();

    if let Some(start) = locate::find_block(&lines, &block, Occurrence::Last) {
        let end = start + block_len - 1;
        let indent = locate::indent_of(&lines[end]).to_string();
        lines.insert(end + 1, marker_line(&indent, key, Direction::Below));
        return lines.join("\n");
    }

    if let Some(at) = slug_anchor(&lines, key) {
        let indent = locate::indent_of(&lines[at]).to_string();
        lines.insert(at + 1, marker_line(&indent, key, Direction::Below));
        return lines.join("\n");
    }

    append_at_eof(&mut lines, key);
    lines.join("\n")
}

/// Last line referencing the key's kebab-cased slug, e.g. a registry entry
/// quoting the generated unit's name.
fn slug_anchor(lines: &[String], key: &str) -> Option<usize> {
    let slug = crate::engine::case::CaseTransform::Kebab.apply(key);
    if slug.is_empty() {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.to_lowercase().contains(&slug))
        .map(|(i, _)| i)
        .next_back()
}

fn append_at_eof(lines: &mut Vec<String>, key: &str) {
    let indent = lines
        .iter()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| locate::indent_of(l).to_string())
        .unwrap_or_default();
    let at = last_non_blank(lines).map(|i| i + 1).unwrap_or(lines.len());
    lines.insert(at, marker_line(&indent, key, Direction::Below));
}

fn last_non_blank(lines: &[String]) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, _)| i)
        .next_back()
}

/// Classification of an expected marker key, by substring of the key name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Import,
    Export,
    Other,
}

/// Fixed rule table: keys naming imports/requires are import-like, keys
/// naming exports are export-like, everything else is placed near list
/// items.
pub fn classify_key(key: &str) -> KeyKind {
    let upper = key.to_uppercase();
    if upper.contains("IMPORT") || upper.contains("REQUIRE") {
        KeyKind::Import
    } else if upper.contains("EXPORT") {
        KeyKind::Export
    } else {
        KeyKind::Other
    }
}

/// A line that brings a module into scope.
pub fn is_import_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("import ") || t.starts_with("import{") || t.contains("require(")
}

/// A line that exports from the current module.
pub fn is_export_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("export ")
        || t.starts_with("export{")
        || t.starts_with("module.exports")
        || t.starts_with("exports.")
}

/// A bare identifier ending in a comma: an entry of a growing array/list.
pub fn is_list_item_line(line: &str) -> bool {
    let t = line.trim();
    let Some(ident) = t.strip_suffix(',') else {
        return false;
    };
    !ident.is_empty()
        && ident
            .chars()
            .next()
            .map(|c| c.is_alphabetic() || c == '_' || c == '$')
            .unwrap_or(false)
        && ident
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Heuristically install markers for `keys` in a file that has none.
///
/// Import-like keys go below the last import line (top of file when there
/// are no imports), export-like keys above the first export line, and the
/// rest below the last list-item line — end of file when no anchor matches.
/// Never runs when any marker already exists: a marked file has opted into
/// explicit marker management. Returns the new text and whether it changed.
pub fn auto_insert_missing_markers(text: &str, keys: &[String]) -> (String, bool) {
    if keys.is_empty() || has_any(text) {
        return (text.to_string(), false);
    }

    let mut lines = split_lines_preserve(text);
    let mut changed = false;

    for key in keys {
        if lines.iter().filter_map(|l| parse_marker(l)).any(|(k, _)| &k == key) {
            continue;
        }
        match classify_key(key) {
            KeyKind::Import => {
                match lines.iter().rposition(|l| is_import_line(l)) {
                    Some(i) => {
                        let indent = locate::indent_of(&lines[i]).to_string();
                        lines.insert(i + 1, marker_line(&indent, key, Direction::Below));
                    }
                    None => lines.insert(0, marker_line("", key, Direction::Below)),
                }
            }
            KeyKind::Export => {
                match lines.iter().position(|l| is_export_line(l)) {
                    Some(i) => {
                        let indent = locate::indent_of(&lines[i]).to_string();
                        lines.insert(i, marker_line(&indent, key, Direction::Below));
                    }
                    None => append_at_eof(&mut lines, key),
                }
            }
            KeyKind::Other => {
                match lines.iter().rposition(|l| is_list_item_line(l)) {
                    Some(i) => {
                        let indent = locate::indent_of(&lines[i]).to_string();
                        lines.insert(i + 1, marker_line(&indent, key, Direction::Below));
                    }
                    None => append_at_eof(&mut lines, key),
                }
            }
        }
        changed = true;
    }

    (lines.join("\n"), changed)
}
