//! The node-action dispatcher.
//!
//! Applies a file node's declared actions to a text body, routing each
//! behaviour to the anchor locator, marker manager, or inline edit it needs.
//! The same logic runs whether the target file pre-exists or was just
//! rendered, so first-run and re-run behavior converge. Missing targets,
//! missing snippets, and already-satisfied guards are silent no-ops:
//! templates are applied against drifting hand-edited files where any anchor
//! may already be gone or already handled.

use std::collections::BTreeMap;

use crate::command::logic::{Action, Behaviour, Logic, StructuredLogic};
use crate::engine::locate::{self, Occurrence, TargetHit};
use crate::engine::marker::{self, Direction};
use crate::engine::merge;
use crate::engine::snippet::split_lines_preserve;

/// Apply every action in order to `text`.
pub fn apply_actions(
    text: &str,
    actions: &[Action],
    snippets: &BTreeMap<String, String>,
) -> String {
    let mut current = text.to_string();
    for action in actions {
        current = apply_action(&current, action, snippets);
    }
    current
}

fn apply_action(text: &str, action: &Action, snippets: &BTreeMap<String, String>) -> String {
    match &action.logic {
        Logic::Raw(body) => raw_fallback(text, &action.key, body),
        Logic::Structured(spec) => match spec.behaviour {
            Behaviour::ReplaceIfMissing => replace_if_missing(text, spec),
            Behaviour::ReplaceBetween => replace_between(text, action, spec, snippets),
            Behaviour::InsertBeforeInline => insert_inline(text, action, spec, snippets, Side::Before),
            Behaviour::InsertAfterInline => insert_inline(text, action, spec, snippets, Side::After),
            Behaviour::InsertBeforeLine => insert_line(text, action, spec, snippets, Side::Before),
            Behaviour::InsertAfterLine => insert_line(text, action, spec, snippets, Side::After),
            Behaviour::AddMarkerAboveTarget => add_marker(text, action, spec, snippets, Side::Before),
            Behaviour::AddMarkerBelowTarget => add_marker(text, action, spec, snippets, Side::After),
        },
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

impl Side {
    fn direction(self) -> Direction {
        match self {
            Side::Before => Direction::Above,
            Side::After => Direction::Below,
        }
    }
}

/// Legacy raw fallback: install a marker after the fallback body's last
/// occurrence, unless the marker already exists.
fn raw_fallback(text: &str, key: &str, body: &str) -> String {
    if marker::exists(text, key) {
        return text.to_string();
    }
    marker::insert_after_fallback_block(text, key, body)
}

/// The marker key an action installs.
fn mark_key<'a>(action: &'a Action, spec: &'a StructuredLogic) -> &'a str {
    spec.mark.as_deref().unwrap_or(&action.key)
}

/// Resolve an action's content: explicit `content` first, then the snippet
/// group matching the action key (exact, then fuzzy via the merge engine's
/// key resolution).
fn resolve_content(
    action: &Action,
    spec: &StructuredLogic,
    snippets: &BTreeMap<String, String>,
) -> Option<String> {
    if let Some(content) = &spec.content {
        return Some(content.clone());
    }
    merge::lookup_snippet(&action.key, snippets).map(|(_, body)| body.clone())
}

fn replace_if_missing(text: &str, spec: &StructuredLogic) -> String {
    let (Some(target), Some(replacement)) = (&spec.target, &spec.replacement) else {
        return text.to_string();
    };
    // Default guard: the replacement itself already being present means the
    // action has run.
    let guard = spec.require_absent.as_deref().unwrap_or(replacement);
    if text.contains(guard) {
        return text.to_string();
    }

    let occurrence = spec.occurrence.unwrap_or(Occurrence::First);
    let at = match occurrence {
        Occurrence::First => text.find(target.as_str()),
        Occurrence::Last => text.rfind(target.as_str()),
    };
    let Some(at) = at else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..at]);
    out.push_str(replacement);
    out.push_str(&text[at + target.len()..]);
    out
}

fn replace_between(
    text: &str,
    action: &Action,
    spec: &StructuredLogic,
    snippets: &BTreeMap<String, String>,
) -> String {
    let (Some(start), Some(end)) = (&spec.target_start, &spec.target_end) else {
        return text.to_string();
    };
    let Some(replacement) = spec
        .replacement
        .clone()
        .or_else(|| resolve_content(action, spec, snippets))
    else {
        return text.to_string();
    };
    if let Some(guard) = &spec.require_absent {
        if text.contains(guard.as_str()) {
            return text.to_string();
        }
    }

    let occurrence = spec.occurrence.unwrap_or(Occurrence::First);
    let Some((span_start, span_end)) = locate::find_anchor_span(text, start, end, occurrence)
    else {
        return text.to_string();
    };

    let mut lines = split_lines_preserve(text);
    let replacement_lines: Vec<String> = replacement.lines().map(|l| l.to_string()).collect();
    lines.splice(span_start..=span_end, replacement_lines);
    lines.join("\n")
}

fn insert_inline(
    text: &str,
    action: &Action,
    spec: &StructuredLogic,
    snippets: &BTreeMap<String, String>,
    side: Side,
) -> String {
    let Some(target) = &spec.target else {
        return text.to_string();
    };
    let Some(content) = resolve_content(action, spec, snippets) else {
        return text.to_string();
    };
    // Inline content collapses to a single line.
    let content = locate::normalize_ws(&content);
    if content.is_empty() {
        return text.to_string();
    }

    let occurrence = spec.occurrence.unwrap_or(Occurrence::Last);
    let Some(hit) = locate::find_target(text, target, occurrence) else {
        return text.to_string();
    };

    let mut lines = split_lines_preserve(text);
    let line = &lines[hit.line];
    let (before, rest) = line.split_at(hit.column);
    let (matched, after) = rest.split_at(target.len());

    // Skip when the content already sits immediately adjacent to the target.
    let already = match side {
        Side::Before => before.trim_end().ends_with(content.as_str()),
        Side::After => after.trim_start().starts_with(content.as_str()),
    };
    if already {
        return text.to_string();
    }

    let rebuilt = match side {
        Side::Before => format!("{before}{content}{matched}{after}"),
        Side::After => format!("{before}{matched}{content}{after}"),
    };
    lines[hit.line] = rebuilt;
    lines.join("\n")
}

fn insert_line(
    text: &str,
    action: &Action,
    spec: &StructuredLogic,
    snippets: &BTreeMap<String, String>,
    side: Side,
) -> String {
    let Some(target) = &spec.target else {
        return text.to_string();
    };
    let key = mark_key(action, spec);

    // Once the marker is installed, future template-driven merges own this
    // insertion point.
    if !spec.fallback_only && marker::exists(text, key) {
        return text.to_string();
    }

    let Some(content) = resolve_content(action, spec, snippets) else {
        return text.to_string();
    };

    let occurrence = spec.occurrence.unwrap_or(Occurrence::Last);
    let Some(hit) = locate::find_target(text, target, occurrence) else {
        return text.to_string();
    };

    let mut lines = split_lines_preserve(text);
    let content_lines = indent_lines(&content, &hit.indent);

    if adjacent_equals(&lines, hit.line, &content_lines, side) {
        if !spec.fallback_only {
            return install_marker_only(&mut lines, hit, key, side);
        }
        return text.to_string();
    }

    // Layout keeps the marker between target and content so the merge
    // engine's adjacency check finds the content on re-runs.
    match side {
        Side::After => {
            let mut at = hit.line + 1;
            if !spec.fallback_only {
                lines.insert(at, marker::marker_line(&hit.indent, key, Direction::Below));
                at += 1;
            }
            for (i, l) in content_lines.into_iter().enumerate() {
                lines.insert(at + i, l);
            }
        }
        Side::Before => {
            let mut at = hit.line;
            for l in content_lines {
                lines.insert(at, l);
                at += 1;
            }
            if !spec.fallback_only {
                lines.insert(at, marker::marker_line(&hit.indent, key, Direction::Above));
            }
        }
    }
    lines.join("\n")
}

fn add_marker(
    text: &str,
    action: &Action,
    spec: &StructuredLogic,
    snippets: &BTreeMap<String, String>,
    side: Side,
) -> String {
    let Some(target) = &spec.target else {
        return text.to_string();
    };
    let key = mark_key(action, spec);
    if !spec.fallback_only && marker::exists(text, key) {
        return text.to_string();
    }

    // Marker creation is deferred until content exists, so an action whose
    // snippet is missing places nothing at all.
    let Some(content) = resolve_content(action, spec, snippets) else {
        return text.to_string();
    };

    let occurrence = spec.occurrence.unwrap_or(Occurrence::Last);
    let Some(hit) = locate::find_target(text, target, occurrence) else {
        return text.to_string();
    };

    let mut lines = split_lines_preserve(text);
    let content_lines = indent_lines(&content, &hit.indent);

    if content_present(&lines, &content) {
        if !spec.fallback_only {
            return install_marker_only(&mut lines, hit, key, side);
        }
        return text.to_string();
    }

    match side {
        Side::After => {
            let mut at = hit.line + 1;
            if !spec.fallback_only {
                lines.insert(at, marker::marker_line(&hit.indent, key, Direction::Below));
                at += 1;
            }
            for (i, l) in content_lines.into_iter().enumerate() {
                lines.insert(at + i, l);
            }
        }
        Side::Before => {
            let mut at = hit.line;
            for l in content_lines {
                lines.insert(at, l);
                at += 1;
            }
            if !spec.fallback_only {
                lines.insert(at, marker::marker_line(&hit.indent, key, Direction::Above));
            }
        }
    }
    lines.join("\n")
}

fn install_marker_only(lines: &mut Vec<String>, hit: TargetHit, key: &str, side: Side) -> String {
    let at = match side {
        Side::Before => hit.line,
        Side::After => hit.line + 1,
    };
    lines.insert(
        at.min(lines.len()),
        marker::marker_line(&hit.indent, key, side.direction()),
    );
    lines.join("\n")
}

fn indent_lines(content: &str, indent: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| {
            if l.trim().is_empty() || l.starts_with(char::is_whitespace) {
                l.to_string()
            } else {
                format!("{indent}{l}")
            }
        })
        .collect()
}

/// Whitespace-normalized containment of `content` anywhere in `lines`.
fn content_present(lines: &[String], content: &str) -> bool {
    let needle: Vec<String> = content
        .lines()
        .map(locate::normalize_ws)
        .filter(|l| !l.is_empty())
        .collect();
    if needle.is_empty() || needle.len() > lines.len() {
        return false;
    }
    let haystack: Vec<String> = lines.iter().map(|l| locate::normalize_ws(l)).collect();
    (0..=haystack.len() - needle.len()).any(|i| haystack[i..i + needle.len()] == needle[..])
}

fn adjacent_equals(lines: &[String], target_line: usize, content: &[String], side: Side) -> bool {
    let window: Vec<&String> = match side {
        Side::After => lines
            .iter()
            .skip(target_line + 1)
            .filter(|l| marker::parse_marker(l).is_none())
            .take(content.len())
            .collect(),
        Side::Before => lines[..target_line]
            .iter()
            .filter(|l| marker::parse_marker(l).is_none())
            .rev()
            .take(content.len())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect(),
    };
    window.len() == content.len()
        && window
            .iter()
            .zip(content)
            .all(|(a, b)| a.trim() == b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::logic::{Action, Behaviour, Logic, StructuredLogic};

    fn structured(behaviour: Behaviour) -> StructuredLogic {
        StructuredLogic {
            behaviour,
            target: None,
            target_start: None,
            target_end: None,
            content: None,
            fallback_only: false,
            occurrence: None,
            require_absent: None,
            replacement: None,
            mark: None,
        }
    }

    fn action(key: &str, spec: StructuredLogic) -> Action {
        Action {
            key: key.to_string(),
            logic: Logic::Structured(spec),
        }
    }

    fn no_snippets() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn replace_if_missing_swaps_and_converges() {
        let mut spec = structured(Behaviour::ReplaceIfMissing);
        spec.target = Some("oldFn()".into());
        spec.replacement = Some("newFn()".into());
        spec.require_absent = Some("newFn()".into());
        let a = action("SWAP", spec);

        let text = "run(oldFn());\n";
        let once = apply_actions(text, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(once, "run(newFn());\n");

        // requireAbsent is now satisfied; re-applying is a no-op.
        let twice = apply_actions(&once, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(twice, once);
    }

    #[test]
    fn replace_if_missing_last_occurrence() {
        let mut spec = structured(Behaviour::ReplaceIfMissing);
        spec.target = Some("x".into());
        spec.replacement = Some("y".into());
        spec.occurrence = Some(Occurrence::Last);
        let a = action("R", spec);

        let out = apply_actions("x and x\n", &[a], &no_snippets());
        assert_eq!(out, "x and y\n");
    }

    #[test]
    fn replace_between_swaps_span_inclusive() {
        let mut spec = structured(Behaviour::ReplaceBetween);
        spec.target_start = Some("BEGIN".into());
        spec.target_end = Some("END".into());
        spec.replacement = Some("replaced();".into());
        let a = action("SPAN", spec);

        let text = "keep\n// BEGIN\nold();\n// END\ntail\n";
        let out = apply_actions(text, &[a], &no_snippets());
        assert_eq!(out, "keep\nreplaced();\ntail\n");
    }

    #[test]
    fn insert_after_inline_appends_on_same_line() {
        let mut spec = structured(Behaviour::InsertAfterInline);
        spec.target = Some("plugins: [".into());
        spec.content = Some("myPlugin(),".into());
        let a = action("PLUGIN", spec);

        let text = "config = { plugins: [] };\n";
        let once = apply_actions(text, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(once, "config = { plugins: [myPlugin(),] };\n");

        let twice = apply_actions(&once, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(twice, once);
    }

    #[test]
    fn insert_before_inline_prepends_on_same_line() {
        let mut spec = structured(Behaviour::InsertBeforeInline);
        spec.target = Some("];".into());
        spec.content = Some("last,".into());
        let a = action("LAST", spec);

        let text = "items = [first, ];\n";
        let once = apply_actions(text, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(once, "items = [first, last,];\n");
        let twice = apply_actions(&once, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(twice, once);
    }

    #[test]
    fn inline_content_is_normalized_to_one_line() {
        let mut spec = structured(Behaviour::InsertAfterInline);
        spec.target = Some("[".into());
        spec.content = Some("a,\n  b,".into());
        let a = action("AB", spec);

        let out = apply_actions("x = [];\n", &[a], &no_snippets());
        assert_eq!(out, "x = [a, b,];\n");
    }

    #[test]
    fn insert_after_line_installs_marker_and_converges() {
        let mut spec = structured(Behaviour::InsertAfterLine);
        spec.target = Some("routes = [".into());
        spec.content = Some("route(\"home\"),".into());
        let a = action("ROUTE", spec);

        let text = "  routes = [\n  ];\n";
        let once = apply_actions(text, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(
            once,
            "  routes = [\n  // ADD ROUTE BELOW\n  route(\"home\"),\n  ];\n"
        );

        // Marker now present: the action defers to future merges.
        let twice = apply_actions(&once, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(twice, once);
    }

    #[test]
    fn insert_before_line_places_content_then_marker() {
        let mut spec = structured(Behaviour::InsertBeforeLine);
        spec.target = Some("export default".into());
        spec.content = Some("registerAll();".into());
        let a = action("REGISTER", spec);

        let text = "setup();\nexport default app;\n";
        let once = apply_actions(text, &[a], &no_snippets());
        assert_eq!(
            once,
            "setup();\nregisterAll();\n// ADD REGISTER ABOVE\nexport default app;\n"
        );
    }

    #[test]
    fn fallback_only_line_insert_skips_marker() {
        let mut spec = structured(Behaviour::InsertAfterLine);
        spec.target = Some("anchor".into());
        spec.content = Some("injected();".into());
        spec.fallback_only = true;
        let a = action("INJ", spec);

        let once = apply_actions("anchor\n", std::slice::from_ref(&a), &no_snippets());
        assert_eq!(once, "anchor\ninjected();\n");

        // No marker, so convergence relies on the adjacency check.
        let twice = apply_actions(&once, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(twice, once);
    }

    #[test]
    fn line_insert_resolves_content_from_snippets() {
        let mut spec = structured(Behaviour::InsertAfterLine);
        spec.target = Some("anchor".into());
        let a = action("WIDGET", spec);

        let mut snippets = BTreeMap::new();
        snippets.insert("WIDGET".to_string(), "widget();".to_string());

        let out = apply_actions("anchor\n", &[a], &snippets);
        assert_eq!(out, "anchor\n// ADD WIDGET BELOW\nwidget();\n");
    }

    #[test]
    fn add_marker_below_target_installs_marker_and_content() {
        let mut spec = structured(Behaviour::AddMarkerBelowTarget);
        spec.target = Some("list = [".into());
        let a = action("ITEM", spec);

        let mut snippets = BTreeMap::new();
        snippets.insert("ITEM".to_string(), "item,".to_string());

        let text = "list = [\n];\n";
        let once = apply_actions(text, std::slice::from_ref(&a), &snippets);
        assert_eq!(once, "list = [\n// ADD ITEM BELOW\nitem,\n];\n");

        let twice = apply_actions(&once, std::slice::from_ref(&a), &snippets);
        assert_eq!(twice, once);
    }

    #[test]
    fn add_marker_without_content_places_nothing() {
        let mut spec = structured(Behaviour::AddMarkerBelowTarget);
        spec.target = Some("anchor".into());
        let a = action("NO SNIPPET HERE", spec);

        let out = apply_actions("anchor\n", &[a], &no_snippets());
        assert_eq!(out, "anchor\n");
    }

    #[test]
    fn add_marker_with_existing_content_installs_marker_only() {
        let mut spec = structured(Behaviour::AddMarkerAboveTarget);
        spec.target = Some("closing];".into());
        let a = action("ITEM", spec);

        let mut snippets = BTreeMap::new();
        snippets.insert("ITEM".to_string(), "item,".to_string());

        let text = "item,\nclosing];\n";
        let out = apply_actions(text, &[a], &snippets);
        assert_eq!(out, "item,\n// ADD ITEM ABOVE\nclosing];\n");
    }

    #[test]
    fn mark_field_overrides_marker_key() {
        let mut spec = structured(Behaviour::InsertAfterLine);
        spec.target = Some("anchor".into());
        spec.content = Some("x();".into());
        spec.mark = Some("CUSTOM KEY".into());
        let a = action("ORIGINAL", spec);

        let out = apply_actions("anchor\n", &[a], &no_snippets());
        assert!(out.contains("// ADD CUSTOM KEY BELOW"));
    }

    #[test]
    fn raw_fallback_installs_marker_after_block() {
        let a = Action {
            key: "LEGACY".to_string(),
            logic: Logic::Raw("known();\nblock();".to_string()),
        };

        let text = "known();\nblock();\ntail\n";
        let once = apply_actions(text, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(once, "known();\nblock();\n// ADD LEGACY BELOW\ntail\n");

        let twice = apply_actions(&once, std::slice::from_ref(&a), &no_snippets());
        assert_eq!(twice, once);
    }

    #[test]
    fn missing_target_is_a_silent_no_op() {
        let mut spec = structured(Behaviour::InsertAfterLine);
        spec.target = Some("not here".into());
        spec.content = Some("x".into());
        let a = action("X", spec);
        assert_eq!(apply_actions("text\n", &[a], &no_snippets()), "text\n");
    }
}
