//! The command template document: a JSON description of a tree of files and
//! folders with optional boilerplate code.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::logic::Action;
use crate::error::{GraftError, Result};

/// Root command document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandTemplate {
    /// Display name; defaults to the file stem when absent.
    #[serde(default)]
    pub name: Option<String>,

    pub file_paths: Vec<FilePathGroup>,

    /// Declared arguments driving variable collection.
    #[serde(default)]
    pub args: Vec<ArgSpec>,

    /// Names of other commands executed with the same variable map.
    #[serde(default)]
    pub run: Vec<String>,
}

/// A base path plus the nodes materialized under it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilePathGroup {
    pub path: String,

    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// A directory (children, no code) or a file (code, no children).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// May contain placeholder tokens.
    pub name: String,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub children: Vec<Node>,

    /// Explicit indexer flag; content sniffing can also mark a file as an
    /// indexer.
    #[serde(default)]
    pub is_indexer: bool,

    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Node {
    /// A node without code is a directory, even when it has no children yet.
    pub fn is_dir(&self) -> bool {
        self.code.is_none()
    }
}

/// A declared command argument.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArgSpec {
    pub key: String,

    /// Prompt text shown to the user.
    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default)]
    pub default: Option<String>,
}

impl CommandTemplate {
    /// Load a command template from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Io {
            context: format!("reading command template {}", path.display()),
            source: e,
        })?;
        let template: CommandTemplate =
            serde_json::from_str(&content).map_err(|e| GraftError::CommandParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(template)
    }

    /// The name used in reports and cycle errors.
    pub fn display_name(&self, fallback: &str) -> String {
        self.name.clone().unwrap_or_else(|| fallback.to_string())
    }

    /// Validate the document for internal consistency.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.file_paths.is_empty() {
            return Err(GraftError::CommandInvalid {
                name: name.to_string(),
                reason: "command declares no filePaths".into(),
            });
        }
        for group in &self.file_paths {
            for node in &group.nodes {
                validate_node(node, name)?;
            }
        }

        let mut keys = BTreeSet::new();
        for arg in &self.args {
            if !keys.insert(arg.key.as_str()) {
                return Err(GraftError::CommandInvalid {
                    name: name.to_string(),
                    reason: format!("duplicate arg key '{}'", arg.key),
                });
            }
        }
        Ok(())
    }
}

fn validate_node(node: &Node, command: &str) -> Result<()> {
    if node.name.trim().is_empty() {
        return Err(GraftError::CommandInvalid {
            name: command.to_string(),
            reason: "node with empty name".into(),
        });
    }
    if node.code.is_some() && !node.children.is_empty() {
        return Err(GraftError::CommandInvalid {
            name: command.to_string(),
            reason: format!("node '{}' has both code and children", node.name),
        });
    }
    if let Some(code) = &node.code {
        check_duplicate_snippet_keys(code, &node.name, command)?;
    }
    for child in &node.children {
        validate_node(child, command)?;
    }
    Ok(())
}

/// Snippet keys must be unique within one code body; extraction silently
/// keeps the last one, so duplicates are caught here instead.
fn check_duplicate_snippet_keys(code: &str, node: &str, command: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for line in code.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("//") else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(key_part) = rest.strip_prefix("START OF ") else {
            continue;
        };
        let key = key_part.trim();
        if !seen.insert(key.to_string()) {
            return Err(GraftError::CommandInvalid {
                name: command.to_string(),
                reason: format!("node '{node}' declares snippet key '{key}' twice"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(json: &str) -> CommandTemplate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_full_document() {
        let template = minimal(
            r#"{
                "name": "route",
                "filePaths": [{
                    "path": "src/routes",
                    "nodes": [{
                        "name": "{{.KebabCaseName}}",
                        "children": [{
                            "name": "{{.KebabCaseName}}.ts",
                            "code": "export const {{.CamelCaseName}} = {};"
                        }]
                    }]
                }],
                "args": [{"key": "Name", "prompt": "Route name"}],
                "run": ["shared-types"]
            }"#,
        );
        assert_eq!(template.display_name("x"), "route");
        assert_eq!(template.file_paths.len(), 1);
        assert_eq!(template.args[0].key, "Name");
        assert_eq!(template.run, vec!["shared-types"]);

        let dir = &template.file_paths[0].nodes[0];
        assert!(dir.is_dir());
        assert!(!dir.children[0].is_dir());
    }

    #[test]
    fn validate_rejects_empty_file_paths() {
        let template = minimal(r#"{"filePaths": []}"#);
        assert!(template.validate("t").is_err());
    }

    #[test]
    fn validate_rejects_code_with_children() {
        let template = minimal(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "bad", "code": "x", "children": [{"name": "c", "code": "y"}]}
            ]}]}"#,
        );
        assert!(template.validate("t").is_err());
    }

    #[test]
    fn validate_rejects_duplicate_snippet_keys() {
        let template = minimal(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "index.ts",
                 "code": "// START OF K\na\n// END OF K\n// START OF K\nb\n// END OF K\n"}
            ]}]}"#,
        );
        assert!(template.validate("t").is_err());
    }

    #[test]
    fn validate_accepts_well_formed_document() {
        let template = minimal(
            r#"{"filePaths": [{"path": ".", "nodes": [
                {"name": "index.ts", "code": "// START OF A\na\n// END OF A\n"}
            ]}]}"#,
        );
        assert!(template.validate("t").is_ok());
    }
}
