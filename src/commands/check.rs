use std::path::Path;

use console::style;
use miette::Result;

use graft::command::schema::{CommandTemplate, Node};
use graft::command::{Logic, TemplateStore};
use graft::engine::{placeholder, snippet};

pub fn run(path: String) -> Result<()> {
    let path = Path::new(&path);

    println!(
        "{} {}",
        style("Checking command template at").bold(),
        style(path.display()).cyan()
    );

    let template = CommandTemplate::load(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut errors: Vec<String> = Vec::new();
    if let Err(e) = template.validate(&stem) {
        errors.push(e.to_string());
    }

    let mut files = 0usize;
    let mut dirs = 0usize;
    let mut snippet_keys = 0usize;
    let mut actions = 0usize;
    let mut raw_fallbacks = 0usize;
    let mut tokens = std::collections::BTreeSet::new();

    for group in &template.file_paths {
        tokens.extend(placeholder::referenced_tokens(&group.path));
        for node in &group.nodes {
            count_node(
                node,
                &mut files,
                &mut dirs,
                &mut snippet_keys,
                &mut actions,
                &mut raw_fallbacks,
                &mut tokens,
            );
        }
    }

    println!("  Name: {}", template.display_name(&stem));
    println!("  Files: {files}, directories: {dirs}");
    println!("  Snippet groups: {snippet_keys}");
    println!("  Actions: {actions} ({raw_fallbacks} legacy fallback)");
    println!("  Declared args: {}", template.args.len());
    if !template.run.is_empty() {
        println!("  Runs: {}", template.run.join(", "));
    }
    if !tokens.is_empty() {
        println!("  Placeholder tokens: {}", join_comma(&tokens));
    }

    // `run` references resolve against sibling files first, then the
    // configured store. Unresolvable names are worth a warning, not an
    // error: the command may ship alongside templates installed elsewhere.
    let mut warnings: Vec<String> = Vec::new();
    if !template.run.is_empty() {
        let sibling_root = path.parent().map(|p| p.to_path_buf());
        let store = TemplateStore::open(sibling_root)?;
        for reference in &template.run {
            if store.resolve(reference).is_err() {
                warnings.push(format!("run reference '{reference}' cannot be resolved"));
            }
        }
    }

    if !warnings.is_empty() {
        println!("\n{}", style("Warnings:").yellow().bold());
        for w in &warnings {
            println!("  {} {}", style("\u{26a0}").yellow(), w);
        }
    }

    if !errors.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for e in &errors {
            println!("  {} {}", style("\u{2717}").red(), e);
        }
        println!(
            "\n{} Command template has {} error(s)",
            style("\u{2717}").red().bold(),
            errors.len()
        );
        std::process::exit(1);
    }

    println!(
        "\n{} Command template is valid!",
        style("\u{2713}").green().bold()
    );
    Ok(())
}

fn count_node(
    node: &Node,
    files: &mut usize,
    dirs: &mut usize,
    snippet_keys: &mut usize,
    actions: &mut usize,
    raw_fallbacks: &mut usize,
    tokens: &mut std::collections::BTreeSet<String>,
) {
    tokens.extend(placeholder::referenced_tokens(&node.name));
    if node.is_dir() {
        *dirs += 1;
    } else {
        *files += 1;
    }
    if let Some(code) = &node.code {
        *snippet_keys += snippet::extract(code).len();
        tokens.extend(placeholder::referenced_tokens(code));
    }
    *actions += node.actions.len();
    *raw_fallbacks += node
        .actions
        .iter()
        .filter(|a| matches!(a.logic, Logic::Raw(_)))
        .count();
    for child in &node.children {
        count_node(child, files, dirs, snippet_keys, actions, raw_fallbacks, tokens);
    }
}

fn join_comma(set: &std::collections::BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}
