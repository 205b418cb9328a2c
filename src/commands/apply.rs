use std::path::PathBuf;

use console::style;
use miette::Result;

use graft::command::TemplateStore;
use graft::materialize::FileOutcome;
use graft::ApplyOptions;

use super::parse_data_pairs;

pub fn run(
    templates: Option<PathBuf>,
    command: String,
    root: Option<String>,
    data: Vec<String>,
    defaults: bool,
    dry_run: bool,
) -> Result<()> {
    let store = TemplateStore::open(templates)?;
    let options = ApplyOptions {
        command,
        root,
        data: parse_data_pairs(data),
        defaults,
    };

    if dry_run {
        let plan = graft::preview_apply(&store, options)?;
        super::preview::print_plan(&plan);
        println!(
            "\n{} Dry run \u{2014} no files written.",
            style("\u{2139}").blue().bold()
        );
        return Ok(());
    }

    let report = graft::apply(&store, options)?;

    for file in &report.touched {
        let word = file.outcome.word();
        let styled = match file.outcome {
            FileOutcome::Created => style(word).green(),
            FileOutcome::Merged => style(word).cyan(),
            FileOutcome::Overwritten => style(word).yellow(),
            FileOutcome::Unchanged => style(word).dim(),
        };
        println!("  {:<9} {}", styled, file.path.display());
    }

    let changed = report
        .touched
        .iter()
        .filter(|f| f.outcome != FileOutcome::Unchanged)
        .count();
    println!(
        "\n{} {} file(s) written, {} unchanged",
        style("\u{2713}").green().bold(),
        changed,
        report.touched.len() - changed
    );

    Ok(())
}
