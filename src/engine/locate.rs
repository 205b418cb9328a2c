//! Target and anchor location inside a text body.
//!
//! All searches are line/substring based. Line-level searches default to the
//! last occurrence (new entries usually belong at the end of a growing
//! list); anchor-pair searches for block replacement default to the first
//! span. Callers pass an explicit [`Occurrence`] to override.

use serde::{Deserialize, Serialize};

/// First/last match selection among multiple candidate locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    First,
    Last,
}

/// The location of a target substring: line index, column of the match
/// within that line, and the line's leading whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHit {
    pub line: usize,
    pub column: usize,
    pub indent: String,
}

/// Find `target` as a substring of some line of `text`.
pub fn find_target(text: &str, target: &str, occurrence: Occurrence) -> Option<TargetHit> {
    if target.is_empty() {
        return None;
    }

    let mut hit = None;
    for (i, line) in text.lines().enumerate() {
        if let Some(column) = line.find(target) {
            let found = TargetHit {
                line: i,
                column,
                indent: indent_of(line).to_string(),
            };
            match occurrence {
                Occurrence::First => return Some(found),
                Occurrence::Last => hit = Some(found),
            }
        }
    }
    hit
}

/// Find an anchor pair: the line containing `start` and the first line at or
/// after it containing `end`. Returns inclusive line indices. Spans do not
/// overlap; `occurrence` selects among the non-overlapping spans.
pub fn find_anchor_span(
    text: &str,
    start: &str,
    end: &str,
    occurrence: Occurrence,
) -> Option<(usize, usize)> {
    if start.is_empty() || end.is_empty() {
        return None;
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut found = None;
    let mut i = 0;
    while i < lines.len() {
        if lines[i].contains(start) {
            let mut j = i;
            while j < lines.len() {
                // The end anchor may sit on the start line itself when it
                // appears after the start anchor.
                let hit = if j == i {
                    let after = lines[i].find(start).map(|c| c + start.len()).unwrap_or(0);
                    lines[i][after..].contains(end)
                } else {
                    lines[j].contains(end)
                };
                if hit {
                    match occurrence {
                        Occurrence::First => return Some((i, j)),
                        Occurrence::Last => {
                            found = Some((i, j));
                            break;
                        }
                    }
                }
                j += 1;
            }
            i = match found {
                Some((_, span_end)) if span_end >= i => span_end + 1,
                _ => i + 1,
            };
        } else {
            i += 1;
        }
    }
    found
}

/// Leading whitespace of a line.
pub fn indent_of(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_ws(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Find a contiguous block of lines matching `block` under per-line
/// whitespace normalization. Blank lines in `block` are ignored for the
/// comparison length. Returns the index of the block's first line.
pub fn find_block(lines: &[String], block: &[String], occurrence: Occurrence) -> Option<usize> {
    let needle: Vec<String> = block
        .iter()
        .map(|l| normalize_ws(l))
        .filter(|l| !l.is_empty())
        .collect();
    if needle.is_empty() || needle.len() > lines.len() {
        return None;
    }

    let haystack: Vec<String> = lines.iter().map(|l| normalize_ws(l)).collect();
    let mut found = None;
    for i in 0..=haystack.len() - needle.len() {
        if haystack[i..i + needle.len()] == needle[..] {
            match occurrence {
                Occurrence::First => return Some(i),
                Occurrence::Last => found = Some(i),
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
const a = 1;
  register(alpha);
const b = 2;
  register(beta);
";

    #[test]
    fn finds_first_and_last_occurrence() {
        let first = find_target(TEXT, "register(", Occurrence::First).unwrap();
        assert_eq!(first.line, 1);
        assert_eq!(first.indent, "  ");

        let last = find_target(TEXT, "register(", Occurrence::Last).unwrap();
        assert_eq!(last.line, 3);
    }

    #[test]
    fn captures_column_of_match() {
        let hit = find_target(TEXT, "alpha", Occurrence::First).unwrap();
        assert_eq!(hit.line, 1);
        assert_eq!(hit.column, "  register(".len());
    }

    #[test]
    fn missing_target_returns_none() {
        assert!(find_target(TEXT, "gamma", Occurrence::First).is_none());
        assert!(find_target(TEXT, "", Occurrence::First).is_none());
    }

    #[test]
    fn anchor_span_first_and_last() {
        let text = "\
begin block
middle
end block
other
begin block
end block
";
        assert_eq!(
            find_anchor_span(text, "begin", "end", Occurrence::First),
            Some((0, 2))
        );
        assert_eq!(
            find_anchor_span(text, "begin", "end", Occurrence::Last),
            Some((4, 5))
        );
    }

    #[test]
    fn anchor_span_on_single_line() {
        let text = "prefix start middle end suffix\n";
        assert_eq!(
            find_anchor_span(text, "start", "end", Occurrence::First),
            Some((0, 0))
        );
    }

    #[test]
    fn find_block_ignores_whitespace_differences() {
        let lines: Vec<String> = ["  foo(  1 );", "bar();", "  foo(  1 );", "bar();"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let block: Vec<String> = ["foo( 1 );", "bar();"].iter().map(|s| s.to_string()).collect();

        assert_eq!(find_block(&lines, &block, Occurrence::First), Some(0));
        assert_eq!(find_block(&lines, &block, Occurrence::Last), Some(2));
    }

    #[test]
    fn indent_and_normalize_helpers() {
        assert_eq!(indent_of("    x"), "    ");
        assert_eq!(indent_of("\t\ty"), "\t\t");
        assert_eq!(indent_of(""), "");
        assert_eq!(normalize_ws("  a   b\tc  "), "a b c");
    }
}
