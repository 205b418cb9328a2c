use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "graft",
    about = "Scaffold boilerplate into a project, merging into existing indexer files",
    version
)]
pub struct Cli {
    /// Directory holding command templates (overrides the configured one)
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a command template to a project directory
    Apply {
        /// Command name, or a path to a command .json file
        command: String,

        /// Target project directory (default: current directory)
        #[arg(short, long)]
        root: Option<String>,

        /// Set variable values (can be repeated: -d key=value)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Use declared defaults without prompting
        #[arg(long)]
        defaults: bool,

        /// Show the plan and per-file diffs without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what applying a command would do, with per-file diffs
    Preview {
        /// Command name, or a path to a command .json file
        command: String,

        /// Target project directory (default: current directory)
        #[arg(short, long)]
        root: Option<String>,

        /// Set variable values (can be repeated: -d key=value)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Use declared defaults without prompting
        #[arg(long)]
        defaults: bool,
    },

    /// List the command templates the store can resolve
    List,

    /// Validate a command template file
    Check {
        /// Path to the command .json file to check
        path: String,
    },
}
