use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GraftError {
    #[error("Command template not found: {name}")]
    #[diagnostic(help("Run `graft list` to see the available command templates"))]
    CommandNotFound { name: String },

    #[error("Failed to parse command template {path}")]
    #[diagnostic(help("Check the JSON syntax of the command file"))]
    CommandParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid command template '{name}': {reason}")]
    CommandInvalid { name: String, reason: String },

    #[error("Circular run reference: {}", chain.join(" -> "))]
    #[diagnostic(help("Remove the cycle from the command's `run` list"))]
    CircularRun { chain: Vec<String> },

    #[error("Failed to parse user config")]
    #[diagnostic(help("Check the TOML syntax in your graft config.toml"))]
    ConfigParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt cancelled by user")]
    PromptCancelled,

    #[error("Prompt failed for '{name}': {message}")]
    PromptFailed { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, GraftError>;
