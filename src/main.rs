mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let templates = cli.templates;
    match cli.command {
        Commands::Apply {
            command,
            root,
            data,
            defaults,
            dry_run,
        } => commands::apply::run(templates, command, root, data, defaults, dry_run),
        Commands::Preview {
            command,
            root,
            data,
            defaults,
        } => commands::preview::run(templates, command, root, data, defaults),
        Commands::List => commands::list::run(templates),
        Commands::Check { path } => commands::check::run(path),
    }
}
