//! Variable collection: resolves a command's declared args into the
//! variable map the placeholder resolver consumes.

use std::collections::{BTreeMap, HashMap};

use crate::command::schema::ArgSpec;
use crate::error::{GraftError, Result};

/// Options controlling how variables are collected.
#[derive(Default)]
pub struct VarOptions {
    /// Pre-supplied key=value overrides (from --data flags).
    pub overrides: HashMap<String, String>,
    /// If true, use defaults without prompting.
    pub use_defaults: bool,
}

/// Collect values for every declared arg: overrides first, then defaults
/// (when requested), then an interactive prompt. Overrides for undeclared
/// keys are kept too, so ad-hoc placeholders can be fed from the command
/// line.
pub fn collect_variables(args: &[ArgSpec], options: &VarOptions) -> Result<BTreeMap<String, String>> {
    let mut values: BTreeMap<String, String> = BTreeMap::new();

    for arg in args {
        if let Some(value) = options.overrides.get(&arg.key) {
            values.insert(arg.key.clone(), value.clone());
            continue;
        }

        if options.use_defaults {
            if let Some(default) = &arg.default {
                values.insert(arg.key.clone(), default.clone());
                continue;
            }
        }

        values.insert(arg.key.clone(), prompt_value(arg)?);
    }

    for (key, value) in &options.overrides {
        values
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    Ok(values)
}

fn prompt_value(arg: &ArgSpec) -> Result<String> {
    let message = arg.prompt.clone().unwrap_or_else(|| arg.key.clone());
    let mut prompt = inquire::Text::new(&message);
    if let Some(default) = &arg.default {
        prompt = prompt.with_default(default);
    }
    match prompt.prompt() {
        Ok(value) => Ok(value),
        Err(inquire::InquireError::OperationCanceled)
        | Err(inquire::InquireError::OperationInterrupted) => Err(GraftError::PromptCancelled),
        Err(e) => Err(GraftError::PromptFailed {
            name: arg.key.clone(),
            message: e.to_string(),
        }),
    }
}
