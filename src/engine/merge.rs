//! The smart-merge algorithm.
//!
//! Walks an existing file line by line, resolves the snippet for each
//! insertion marker (exact key first, then fuzzy), and inserts it exactly
//! once. Layered idempotency checks make repeated merges no-ops, so the
//! function is safe to re-run arbitrarily many times against drifting
//! hand-edited files.

use std::collections::{BTreeMap, BTreeSet};

use regex_lite::Regex;

use crate::engine::locate::normalize_ws;
use crate::engine::marker::{self, Direction};
use crate::engine::snippet::{self, split_lines_preserve};

/// Merge a template's snippet groups into `existing` at its markers.
///
/// Idempotent: `smart_merge(smart_merge(a, t), t) == smart_merge(a, t)`.
pub fn smart_merge(existing: &str, template: &str) -> String {
    let snippets = snippet::extract(template);
    if snippets.is_empty() {
        return existing.to_string();
    }

    let lines = split_lines_preserve(existing);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut consumed: BTreeSet<String> = BTreeSet::new();

    for (i, line) in lines.iter().enumerate() {
        let Some((marker_key, direction)) = marker::parse_marker(line) else {
            out.push(line.clone());
            continue;
        };

        let Some((snippet_key, body)) = lookup_snippet(&marker_key, &snippets) else {
            out.push(line.clone());
            continue;
        };

        // One insertion per key per pass; duplicate markers for a handled
        // key are dropped from the output.
        if consumed.contains(snippet_key) {
            continue;
        }
        consumed.insert(snippet_key.clone());

        if already_present(&lines, i, body, direction) {
            out.push(line.clone());
            continue;
        }

        match direction {
            Direction::Below => {
                out.push(line.clone());
                out.extend(body.lines().map(|l| l.to_string()));
            }
            Direction::Above => {
                out.extend(body.lines().map(|l| l.to_string()));
                out.push(line.clone());
            }
        }
    }

    out.join("\n")
}

/// Uppercase-alphanumeric-only form of a key, the basis for fuzzy matching.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Resolve the snippet for a marker or action key.
///
/// Exact match first. Otherwise both sides are sanitized: an exact sanitized
/// match wins, then a containment match (marker key inside a snippet key),
/// then reverse containment. Multiple candidates resolve to the shortest
/// key; remaining ties break lexicographically, so resolution never
/// alternates between runs.
pub fn lookup_snippet<'a>(
    marker_key: &str,
    snippets: &'a BTreeMap<String, String>,
) -> Option<(&'a String, &'a String)> {
    if let Some((k, v)) = snippets.get_key_value(marker_key) {
        return Some((k, v));
    }

    let wanted = sanitize_key(marker_key);
    if wanted.is_empty() {
        return None;
    }

    let sanitized: Vec<(&String, String)> = snippets
        .keys()
        .map(|k| (k, sanitize_key(k)))
        .collect();

    if let Some((k, _)) = sanitized.iter().find(|(_, s)| *s == wanted) {
        return snippets.get_key_value(k.as_str());
    }

    // Shortest candidate wins; remaining ties break lexicographically.
    let containing = sanitized
        .iter()
        .filter(|(_, s)| s.contains(&wanted))
        .map(|(k, _)| *k)
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    if let Some(k) = containing {
        return snippets.get_key_value(k.as_str());
    }

    let contained = sanitized
        .iter()
        .filter(|(_, s)| !s.is_empty() && wanted.contains(s.as_str()))
        .map(|(k, _)| *k)
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))?;
    snippets.get_key_value(contained.as_str())
}

/// Layered idempotency checks run before inserting a snippet at a marker.
fn already_present(lines: &[String], marker_index: usize, body: &str, direction: Direction) -> bool {
    let body_lines: Vec<&str> = body.lines().collect();
    let needle: Vec<String> = body_lines
        .iter()
        .map(|l| normalize_ws(l))
        .filter(|l| !l.is_empty())
        .collect();
    if needle.is_empty() {
        return true;
    }

    // Whitespace-normalized containment anywhere in the file.
    let haystack: Vec<String> = lines.iter().map(|l| normalize_ws(l)).collect();
    if haystack.len() >= needle.len() {
        for i in 0..=haystack.len() - needle.len() {
            if haystack[i..i + needle.len()] == needle[..] {
                return true;
            }
        }
    }

    // Single array-item line, compared with all whitespace removed.
    if body_lines.len() == 1 {
        let stripped = strip_ws(body_lines[0]);
        if stripped.ends_with(',') && lines.iter().any(|l| strip_ws(l) == stripped) {
            return true;
        }
    }

    // An import of the same module path already exists.
    let import_paths: Vec<String> = body_lines
        .iter()
        .filter_map(|l| import_module_path(l))
        .collect();
    if !import_paths.is_empty()
        && import_paths.len() == body_lines.iter().filter(|l| !l.trim().is_empty()).count()
    {
        let existing_paths: BTreeSet<String> =
            lines.iter().filter_map(|l| import_module_path(l)).collect();
        if import_paths.iter().all(|p| existing_paths.contains(p)) {
            return true;
        }
    }

    // The lines adjacent to the marker, in the insertion direction, already
    // equal the snippet.
    let adjacent: Vec<&String> = match direction {
        Direction::Below => lines.iter().skip(marker_index + 1).take(body_lines.len()).collect(),
        Direction::Above => {
            let start = marker_index.saturating_sub(body_lines.len());
            lines[start..marker_index].iter().collect()
        }
    };
    if adjacent.len() == body_lines.len()
        && adjacent
            .iter()
            .zip(&body_lines)
            .all(|(a, b)| a.trim() == b.trim())
    {
        return true;
    }

    false
}

fn strip_ws(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Extract the module path from an import/require line.
pub fn import_module_path(line: &str) -> Option<String> {
    let t = line.trim_start();
    if !(t.starts_with("import ")
        || t.starts_with("import{")
        || t.starts_with("import\"")
        || t.starts_with("import'")
        || t.starts_with("export ")
        || t.contains("require("))
    {
        return None;
    }

    let from_re = Regex::new(r#"from\s+['"]([^'"]+)['"]"#).unwrap();
    if let Some(caps) = from_re.captures(t) {
        return Some(caps[1].to_string());
    }
    let require_re = Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();
    if let Some(caps) = require_re.captures(t) {
        return Some(caps[1].to_string());
    }
    let bare_re = Regex::new(r#"^import\s*['"]([^'"]+)['"]"#).unwrap();
    if let Some(caps) = bare_re.captures(t) {
        return Some(caps[1].to_string());
    }
    None
}

/// Post-merge cleanup: removes a later duplicate import line for a module
/// path already imported earlier, and a later duplicate bare-identifier
/// list-item line, whitespace-normalized. First occurrence wins.
pub fn dedupe(text: &str) -> String {
    let lines = split_lines_preserve(text);
    let mut seen_imports: BTreeSet<String> = BTreeSet::new();
    let mut seen_items: BTreeSet<String> = BTreeSet::new();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    for line in lines {
        if marker::is_import_line(&line) {
            if let Some(path) = import_module_path(&line) {
                if !seen_imports.insert(path) {
                    continue;
                }
            }
        } else if marker::is_list_item_line(&line) {
            if !seen_items.insert(strip_ws(&line)) {
                continue;
            }
        }
        out.push(line);
    }

    out.join("\n")
}
