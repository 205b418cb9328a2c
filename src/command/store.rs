//! The template store: resolves command names to JSON documents on disk.
//!
//! Built explicitly at startup and passed by reference; there is no
//! process-wide registry. A name resolves to `<name>.json` under any of the
//! store's roots (an explicit `--templates` directory, the directory from
//! user config, then the default config-dir location), searched recursively.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::command::schema::CommandTemplate;
use crate::error::{GraftError, Result};

/// User-level configuration loaded from `~/.config/graft/config.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Overrides the default command-template directory.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("graft").join("config.toml"))
}

/// Load user configuration from the XDG config directory.
///
/// Returns `Ok(None)` if the config file does not exist.
pub fn load_user_config() -> Result<Option<UserConfig>> {
    let path = match config_path() {
        Some(p) => p,
        None => return Ok(None),
    };
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| GraftError::Io {
        context: format!("reading user config {}", path.display()),
        source: e,
    })?;
    let config: UserConfig =
        toml::from_str(&content).map_err(|e| GraftError::ConfigParse { source: e })?;
    Ok(Some(config))
}

pub struct TemplateStore {
    roots: Vec<PathBuf>,
}

impl TemplateStore {
    /// Open the store. `explicit` (from `--templates`) has the highest
    /// priority, then the user-config directory, then the default location.
    pub fn open(explicit: Option<PathBuf>) -> Result<Self> {
        let mut roots = Vec::new();
        if let Some(dir) = explicit {
            roots.push(dir);
        }
        if let Some(config) = load_user_config()? {
            if let Some(dir) = config.templates_dir {
                roots.push(dir);
            }
        }
        if let Some(dir) = dirs::config_dir() {
            roots.push(dir.join("graft").join("commands"));
        }
        Ok(Self { roots })
    }

    /// A store over fixed roots, for tests and embedding.
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Names of every command the store can resolve, sorted and deduplicated.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .roots
            .iter()
            .filter(|r| r.exists())
            .flat_map(|root| {
                WalkDir::new(root)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .filter_map(|e| {
                        e.path()
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Resolve a name to its JSON file. A name that is itself a path to an
    /// existing `.json` file loads directly, which is how ad-hoc templates
    /// and `graft check` work.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let direct = Path::new(name);
        if direct.extension().is_some_and(|ext| ext == "json") && direct.exists() {
            return Ok(direct.to_path_buf());
        }

        let file_name = format!("{name}.json");
        for root in self.roots.iter().filter(|r| r.exists()) {
            let found = WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .find(|e| {
                    e.file_type().is_file()
                        && e.file_name().to_string_lossy() == file_name.as_str()
                });
            if let Some(entry) = found {
                return Ok(entry.path().to_path_buf());
            }
        }
        Err(GraftError::CommandNotFound {
            name: name.to_string(),
        })
    }

    /// Load and validate a command by name.
    pub fn load(&self, name: &str) -> Result<CommandTemplate> {
        let path = self.resolve(name)?;
        let template = CommandTemplate::load(&path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        template.validate(&stem)?;
        Ok(template)
    }
}
