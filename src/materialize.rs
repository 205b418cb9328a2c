//! The tree materializer: walks a command's node tree, creates directories,
//! and writes or merges each file.
//!
//! Per-file handling is a pure function from (existing content, rendered
//! template code, actions) to new content; this module only adds path
//! resolution, the binary-target guard, and whole-file writes. A run either
//! completes a file's write or leaves it untouched — there is no
//! partial-file state.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use regex_lite::Regex;

use crate::command::logic::Action;
use crate::command::schema::{CommandTemplate, Node};
use crate::engine::{actions, marker, merge, placeholder, snippet};
use crate::error::{GraftError, Result};

/// What happened to one file during materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Created,
    Merged,
    Overwritten,
    Unchanged,
}

impl FileOutcome {
    pub fn word(self) -> &'static str {
        match self {
            FileOutcome::Created => "create",
            FileOutcome::Merged => "merge",
            FileOutcome::Overwritten => "overwrite",
            FileOutcome::Unchanged => "keep",
        }
    }
}

#[derive(Debug)]
pub struct TouchedFile {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// The touched-file report returned to the caller; no global state is kept.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub touched: Vec<TouchedFile>,
    pub dirs_created: Vec<PathBuf>,
}

/// One entry of a dry-run plan.
#[derive(Debug)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    /// Unified diff against the existing content, for merges/overwrites.
    pub diff: Option<String>,
}

fn indexer_sniff_re() -> Regex {
    Regex::new(r"^\s*//\s*THIS\s+IS\s+AN\s+INDEXER\s+FILE").unwrap()
}

/// A file opts into merge handling via the explicit flag, a literal sniff
/// comment, or the presence of at least one snippet group.
pub fn is_indexer(node_flag: bool, code: &str) -> bool {
    if node_flag {
        return true;
    }
    let sniff = indexer_sniff_re();
    if code.lines().any(|l| sniff.is_match(l)) {
        return true;
    }
    !snippet::extract(code).is_empty()
}

/// Render the final content for one file node.
///
/// `existing` is `None` when the file does not exist yet. Actions run in
/// both cases, so a fresh file receives first-run content and re-runs
/// converge on the same result.
pub fn render_file(existing: Option<&str>, code: &str, actions_list: &[Action]) -> String {
    let snippets = snippet::extract(code);

    match existing {
        Some(old) => {
            let keys: Vec<String> = snippets.keys().cloned().collect();
            let (text, _) = marker::auto_insert_missing_markers(old, &keys);
            let text = merge::smart_merge(&text, code);
            let text = actions::apply_actions(&text, actions_list, &snippets);
            merge::dedupe(&text)
        }
        None => {
            let text = snippet::strip(code);
            let text = actions::apply_actions(&text, actions_list, &snippets);
            merge::dedupe(&text)
        }
    }
}

/// Materialize a command template under `root` with the given variables.
pub fn materialize(
    template: &CommandTemplate,
    root: &Path,
    variables: &BTreeMap<String, String>,
) -> Result<MaterializeReport> {
    let mut report = MaterializeReport::default();
    for group in &template.file_paths {
        let base = root.join(placeholder::resolve_name(&group.path, variables));
        ensure_dir(&base, &mut report)?;
        for node in &group.nodes {
            materialize_node(&base, node, variables, &mut report)?;
        }
    }
    Ok(report)
}

fn materialize_node(
    dir: &Path,
    node: &Node,
    variables: &BTreeMap<String, String>,
    report: &mut MaterializeReport,
) -> Result<()> {
    let name = placeholder::resolve_name(&node.name, variables);
    let path = dir.join(&name);

    if node.is_dir() {
        ensure_dir(&path, report)?;
        for child in &node.children {
            materialize_node(&path, child, variables, report)?;
        }
        return Ok(());
    }

    let code = placeholder::resolve(node.code.as_deref().unwrap_or_default(), variables);
    let existed = path.exists();
    let (existing, outcome_kind) = read_target(&path, &code, node.is_indexer)?;
    let rendered = render_file(existing.as_deref(), &code, &node.actions);

    let outcome = match (&existing, outcome_kind) {
        (Some(old), _) if *old == rendered => FileOutcome::Unchanged,
        (Some(_), TargetKind::Indexer) => FileOutcome::Merged,
        (Some(_), TargetKind::Plain) => FileOutcome::Overwritten,
        (None, _) if existed => FileOutcome::Overwritten,
        (None, _) => FileOutcome::Created,
    };

    if outcome != FileOutcome::Unchanged {
        std::fs::write(&path, &rendered).map_err(|e| GraftError::Io {
            context: format!("writing {}", path.display()),
            source: e,
        })?;
    }
    report.touched.push(TouchedFile { path, outcome });
    Ok(())
}

enum TargetKind {
    Indexer,
    Plain,
}

/// Read the target file when present. Indexer handling needs the old text;
/// plain nodes (and binary targets, which are never merged into) overwrite,
/// so their content is still read for change detection but the rendered
/// output ignores it.
fn read_target(path: &Path, code: &str, node_flag: bool) -> Result<(Option<String>, TargetKind)> {
    if !path.exists() {
        let kind = if is_indexer(node_flag, code) {
            TargetKind::Indexer
        } else {
            TargetKind::Plain
        };
        return Ok((None, kind));
    }

    if is_binary_file(path) {
        return Ok((None, TargetKind::Plain));
    }

    let content = std::fs::read_to_string(path).map_err(|e| GraftError::Io {
        context: format!("reading {}", path.display()),
        source: e,
    })?;

    if is_indexer(node_flag, code) {
        Ok((Some(content), TargetKind::Indexer))
    } else {
        // Existing non-indexer files are fully overwritten; the old content
        // only matters for detecting a no-op write.
        Ok((Some(content), TargetKind::Plain))
    }
}

/// Build the dry-run plan: identical name/path/content resolution, no
/// writes.
pub fn preview(
    template: &CommandTemplate,
    root: &Path,
    variables: &BTreeMap<String, String>,
) -> Result<Vec<PlannedFile>> {
    let mut plan = Vec::new();
    for group in &template.file_paths {
        let base = root.join(placeholder::resolve_name(&group.path, variables));
        for node in &group.nodes {
            preview_node(&base, node, variables, &mut plan)?;
        }
    }
    Ok(plan)
}

fn preview_node(
    dir: &Path,
    node: &Node,
    variables: &BTreeMap<String, String>,
    plan: &mut Vec<PlannedFile>,
) -> Result<()> {
    let name = placeholder::resolve_name(&node.name, variables);
    let path = dir.join(&name);

    if node.is_dir() {
        for child in &node.children {
            preview_node(&path, child, variables, plan)?;
        }
        return Ok(());
    }

    let code = placeholder::resolve(node.code.as_deref().unwrap_or_default(), variables);
    let existed = path.exists();
    let (existing, kind) = read_target(&path, &code, node.is_indexer)?;
    let rendered = render_file(existing.as_deref(), &code, &node.actions);

    let (outcome, diff) = match (&existing, kind) {
        (Some(old), _) if *old == rendered => (FileOutcome::Unchanged, None),
        (Some(old), TargetKind::Indexer) => {
            (FileOutcome::Merged, Some(unified_diff(old, &rendered, &path)))
        }
        (Some(old), TargetKind::Plain) => (
            FileOutcome::Overwritten,
            Some(unified_diff(old, &rendered, &path)),
        ),
        (None, _) if existed => (FileOutcome::Overwritten, None),
        (None, _) => (FileOutcome::Created, None),
    };
    plan.push(PlannedFile { path, outcome, diff });
    Ok(())
}

fn unified_diff(old: &str, new: &str, path: &Path) -> String {
    let name = path.display().to_string();
    similar::TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(2)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

fn ensure_dir(path: &Path, report: &mut MaterializeReport) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| GraftError::Io {
        context: format!("creating directory {}", path.display()),
        source: e,
    })?;
    report.dirs_created.push(path.to_path_buf());
    Ok(())
}

/// Detect binary files (BOM-aware, null-byte scanning). Reads only the
/// first 8KB to avoid unnecessary allocation for large files.
fn is_binary_file(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    let mut buf = [0u8; 8192];
    let Ok(n) = file.take(8192).read(&mut buf) else {
        return false;
    };
    !content_inspector::inspect(&buf[..n]).is_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexer_detection_rules() {
        assert!(is_indexer(true, "plain"));
        assert!(is_indexer(false, "// THIS IS AN INDEXER FILE\ncode"));
        assert!(is_indexer(false, "//THIS IS AN INDEXER FILE\ncode"));
        assert!(is_indexer(false, "// START OF X\nx\n// END OF X\n"));
        assert!(!is_indexer(false, "plain code\n"));
    }

    #[test]
    fn render_fresh_file_strips_delimiters() {
        let code = "head\n// START OF A\nbody\n// END OF A\n";
        assert_eq!(render_file(None, code, &[]), "head\nbody\n");
    }

    #[test]
    fn render_existing_indexer_merges_at_marker() {
        let code = "// START OF A\nimport A from \"./a\";\n// END OF A\n";
        let existing = "// ADD A BELOW\nrest();\n";
        let out = render_file(Some(existing), code, &[]);
        assert_eq!(out, "// ADD A BELOW\nimport A from \"./a\";\nrest();\n");
    }

    #[test]
    fn render_is_idempotent_over_reruns() {
        let code = "// START OF A\nimport A from \"./a\";\n// END OF A\n";
        let existing = "// ADD A BELOW\nrest();\n";
        let once = render_file(Some(existing), code, &[]);
        let twice = render_file(Some(&once), code, &[]);
        assert_eq!(once, twice);
    }

    #[test]
    fn render_auto_inserts_markers_into_legacy_file() {
        let code = "// START OF WIDGET IMPORT\nimport W from \"./w\";\n// END OF WIDGET IMPORT\n";
        let existing = "import A from \"./a\";\nsetup();\n";
        let out = render_file(Some(existing), code, &[]);
        assert_eq!(
            out,
            "import A from \"./a\";\n// ADD WIDGET IMPORT BELOW\nimport W from \"./w\";\nsetup();\n"
        );
    }

    #[test]
    fn materialize_creates_tree_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let template: CommandTemplate = serde_json::from_str(
            r#"{"filePaths": [{"path": "src/{{.KebabCaseName}}", "nodes": [
                {"name": "{{.KebabCaseName}}.ts",
                 "code": "export const {{.CamelCaseName}} = {};\n"}
            ]}]}"#,
        )
        .unwrap();
        let variables = BTreeMap::from([("Name".to_string(), "my-widget".to_string())]);

        let report = materialize(&template, dir.path(), &variables).unwrap();
        assert_eq!(report.touched.len(), 1);
        assert_eq!(report.touched[0].outcome, FileOutcome::Created);

        let written = dir.path().join("src/my-widget/my-widget.ts");
        let content = std::fs::read_to_string(written).unwrap();
        assert_eq!(content, "export const myWidget = {};\n");
    }

    #[test]
    fn second_materialize_run_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let template: CommandTemplate = serde_json::from_str(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "index.ts",
                 "code": "// START OF A\nimport A from \"./a\";\n// END OF A\n"}
            ]}]}"#,
        )
        .unwrap();
        let variables = BTreeMap::new();

        let first = materialize(&template, dir.path(), &variables).unwrap();
        assert_eq!(first.touched[0].outcome, FileOutcome::Created);

        // The second run installs the marker the template expects; from the
        // third run on, the file is stable.
        let second = materialize(&template, dir.path(), &variables).unwrap();
        assert_eq!(second.touched[0].outcome, FileOutcome::Merged);
        let stable = std::fs::read_to_string(dir.path().join("index.ts")).unwrap();
        assert!(stable.contains("// ADD A BELOW"));

        let third = materialize(&template, dir.path(), &variables).unwrap();
        assert_eq!(third.touched[0].outcome, FileOutcome::Unchanged);
    }

    #[test]
    fn preview_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let template: CommandTemplate = serde_json::from_str(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "new.ts", "code": "fresh\n"}
            ]}]}"#,
        )
        .unwrap();
        let plan = preview(&template, dir.path(), &BTreeMap::new()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].outcome, FileOutcome::Created);
        assert!(!plan[0].path.exists());
    }

    #[test]
    fn preview_diffs_merged_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.ts"), "// ADD A BELOW\n").unwrap();
        let template: CommandTemplate = serde_json::from_str(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "index.ts",
                 "code": "// START OF A\nadded();\n// END OF A\n"}
            ]}]}"#,
        )
        .unwrap();
        let plan = preview(&template, dir.path(), &BTreeMap::new()).unwrap();
        assert_eq!(plan[0].outcome, FileOutcome::Merged);
        assert!(plan[0].diff.as_deref().unwrap().contains("+added();"));
    }

    #[test]
    fn binary_target_is_overwritten_not_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.ts");
        std::fs::write(&path, (0u8..=255).collect::<Vec<u8>>()).unwrap();

        let template: CommandTemplate = serde_json::from_str(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "blob.ts", "isIndexer": true,
                 "code": "// START OF A\na\n// END OF A\ntext\n"}
            ]}]}"#,
        )
        .unwrap();
        let report = materialize(&template, dir.path(), &BTreeMap::new()).unwrap();
        assert_eq!(report.touched[0].outcome, FileOutcome::Overwritten);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a\ntext\n");
    }
}
