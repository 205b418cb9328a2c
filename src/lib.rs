pub mod command;
pub mod engine;
pub mod error;
pub mod materialize;
pub mod vars;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::command::schema::ArgSpec;
use crate::command::{CommandTemplate, TemplateStore};
use crate::error::{GraftError, Result};
use crate::materialize::{MaterializeReport, PlannedFile};
use crate::vars::{collect_variables, VarOptions};

pub struct ApplyOptions {
    pub command: String,
    pub root: Option<String>,
    pub data: Vec<(String, String)>,
    pub defaults: bool,
}

/// Everything needed to execute an apply that has been planned but not yet
/// written: the resolved command chain, target root, and variable map.
pub struct ApplyPlan {
    pub root: PathBuf,
    pub variables: BTreeMap<String, String>,
    /// The requested command plus every `run` reference, cycle-checked, in
    /// execution order.
    pub chain: Vec<(String, CommandTemplate)>,
}

/// Plan an apply: resolve the command (and its `run` chain), collect
/// variables. Does **not** write any files.
pub fn plan_apply(store: &TemplateStore, options: ApplyOptions) -> Result<ApplyPlan> {
    let chain = resolve_chain(store, &options.command)?;

    let root = match &options.root {
        Some(r) => PathBuf::from(r),
        None => std::env::current_dir().map_err(|e| GraftError::Io {
            context: "getting current directory".into(),
            source: e,
        })?,
    };

    // Union of the declared args across the whole chain, first declaration
    // wins, so a composed command prompts once per key.
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut args: Vec<ArgSpec> = Vec::new();
    for (_, template) in &chain {
        for arg in &template.args {
            if seen.insert(arg.key.clone()) {
                args.push(arg.clone());
            }
        }
    }

    let variables = collect_variables(
        &args,
        &VarOptions {
            overrides: options.data.into_iter().collect(),
            use_defaults: options.defaults,
        },
    )?;

    Ok(ApplyPlan {
        root,
        variables,
        chain,
    })
}

/// Execute a previously planned apply: materialize every command in the
/// chain and combine the touched-file reports.
pub fn execute_apply(plan: &ApplyPlan) -> Result<MaterializeReport> {
    std::fs::create_dir_all(&plan.root).map_err(|e| GraftError::Io {
        context: format!("creating target directory {}", plan.root.display()),
        source: e,
    })?;

    let mut combined = MaterializeReport::default();
    for (_, template) in &plan.chain {
        let report = materialize::materialize(template, &plan.root, &plan.variables)?;
        combined.touched.extend(report.touched);
        combined.dirs_created.extend(report.dirs_created);
    }
    Ok(combined)
}

/// Apply a command template to a project directory.
pub fn apply(store: &TemplateStore, options: ApplyOptions) -> Result<MaterializeReport> {
    let plan = plan_apply(store, options)?;
    execute_apply(&plan)
}

/// Dry-run: the same path/name/content resolution as [`apply`], without
/// writing.
pub fn preview_apply(store: &TemplateStore, options: ApplyOptions) -> Result<Vec<PlannedFile>> {
    let plan = plan_apply(store, options)?;
    let mut combined = Vec::new();
    for (_, template) in &plan.chain {
        combined.extend(materialize::preview(template, &plan.root, &plan.variables)?);
    }
    Ok(combined)
}

/// Resolve a command and its `run` references depth-first. A command runs
/// at most once; a cycle is an error naming the offending chain.
fn resolve_chain(store: &TemplateStore, name: &str) -> Result<Vec<(String, CommandTemplate)>> {
    let mut chain = Vec::new();
    let mut executed: BTreeSet<String> = BTreeSet::new();
    let mut path: Vec<String> = Vec::new();
    visit(store, name, &mut chain, &mut executed, &mut path)?;
    Ok(chain)
}

fn visit(
    store: &TemplateStore,
    name: &str,
    chain: &mut Vec<(String, CommandTemplate)>,
    executed: &mut BTreeSet<String>,
    path: &mut Vec<String>,
) -> Result<()> {
    if path.iter().any(|n| n == name) {
        let mut cycle = path.clone();
        cycle.push(name.to_string());
        return Err(GraftError::CircularRun { chain: cycle });
    }
    if !executed.insert(name.to_string()) {
        return Ok(());
    }

    let template = store.load(name)?;
    path.push(name.to_string());
    chain.push((name.to_string(), template.clone()));
    for reference in &template.run {
        visit(store, reference, chain, executed, path)?;
    }
    path.pop();
    Ok(())
}
