//! Actions command implementation
//!
//! Lists every rule action type with the validator capability that checks it
//! and the class of effect it produces.

use crate::cli::args::OutputFormat;
use crate::cli::common::{EXIT_ERROR, EXIT_SUCCESS};
use crate::error::RuleError;
use crate::output::{ActionInfo, ActionListHumanFormatter, ActionListJsonlFormatter};
use crate::rules::{ExecutorRegistry, ValidatorRegistry};

/// Run the actions command
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 2: Error (registries could not be built)
pub fn run_actions(format: OutputFormat) -> i32 {
    match collect_actions() {
        Ok(actions) => {
            match format {
                OutputFormat::Human => ActionListHumanFormatter::new().write_to_stdout(&actions),
                OutputFormat::Jsonl => ActionListJsonlFormatter::new().write_to_stdout(&actions),
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    }
}

fn collect_actions() -> Result<Vec<ActionInfo>, RuleError> {
    let validators = ValidatorRegistry::with_defaults()?;
    let executors = ExecutorRegistry::with_defaults()?;
    Ok(ActionInfo::collect(&validators, |action_type| {
        executors.executor_for(action_type).is_some()
    }))
}
