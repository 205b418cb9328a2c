use std::path::PathBuf;

use console::style;
use miette::Result;

use graft::command::TemplateStore;
use graft::materialize::{FileOutcome, PlannedFile};
use graft::ApplyOptions;

use super::parse_data_pairs;

pub fn run(
    templates: Option<PathBuf>,
    command: String,
    root: Option<String>,
    data: Vec<String>,
    defaults: bool,
) -> Result<()> {
    let store = TemplateStore::open(templates)?;
    let plan = graft::preview_apply(
        &store,
        ApplyOptions {
            command,
            root,
            data: parse_data_pairs(data),
            defaults,
        },
    )?;

    print_plan(&plan);
    Ok(())
}

pub fn print_plan(plan: &[PlannedFile]) {
    println!("{}", style("Planned changes:").bold());
    for file in plan {
        let word = file.outcome.word();
        let styled = match file.outcome {
            FileOutcome::Created => style(word).green(),
            FileOutcome::Merged => style(word).cyan(),
            FileOutcome::Overwritten => style(word).yellow(),
            FileOutcome::Unchanged => style(word).dim(),
        };
        println!("  {:<9} {}", styled, file.path.display());

        if let Some(diff) = &file.diff {
            for line in diff.lines() {
                let rendered = if line.starts_with('+') && !line.starts_with("+++") {
                    style(line).green().to_string()
                } else if line.starts_with('-') && !line.starts_with("---") {
                    style(line).red().to_string()
                } else {
                    style(line).dim().to_string()
                };
                println!("    {rendered}");
            }
        }
    }
}
