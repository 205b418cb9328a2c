use std::path::PathBuf;

use console::style;
use miette::Result;

use graft::command::TemplateStore;

pub fn run(templates: Option<PathBuf>) -> Result<()> {
    let store = TemplateStore::open(templates)?;
    let names = store.list();

    if names.is_empty() {
        println!("No command templates found.");
        println!(
            "  Put .json command files under your config directory or pass {}",
            style("--templates <DIR>").cyan()
        );
        return Ok(());
    }

    println!("{}", style("Available commands:").bold());
    for name in names {
        println!("  {name}");
    }
    Ok(())
}
