//! Import command implementation
//!
//! This module implements the `tracker-import import` command, which:
//! - Loads configuration from import.toml
//! - Parses the JSON bundle and the optional seed bundle
//! - Runs the validate-then-commit pipeline against an in-memory store
//! - Formats the import report (human or JSONL)
//! - Returns the exit code matching the report status

use crate::cli::args::{ColorChoice, OutputFormat};
use crate::cli::common::{
    EXIT_ERROR, EXIT_IMPORT_FAILED, EXIT_PARSE_ERROR, EXIT_SUCCESS, load_config, load_store,
    resolve_color, resolve_format,
};
use crate::error::{ConfigError, ImportError};
use crate::import::{BundleMode, ImportBundle, ImportPipeline, LoggingDispatcher};
use crate::output::{HumanFormatter, JsonlFormatter};
use crate::report::Report;
use crate::types::ImportStatus;
use std::path::Path;

/// Options of one `import` invocation
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions<'a> {
    pub bundle: &'a Path,
    pub config: Option<&'a Path>,
    pub format: Option<OutputFormat>,
    pub validate_only: bool,
    pub seed: Option<&'a Path>,
    pub color: ColorChoice,
}

/// Run the import command
///
/// # Returns
///
/// Exit code:
/// - 0: Import status OK or WARNING
/// - 1: Import status ERROR
/// - 2: Error (configuration/I/O error)
/// - 3: Parse error (invalid TOML configuration or JSON bundle)
pub fn run_import(options: ImportOptions) -> i32 {
    match run_import_inner(options) {
        Ok(ImportStatus::Error) => EXIT_IMPORT_FAILED,
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                ImportError::Config(ConfigError::Parse(_) | ConfigError::Json(_)) => {
                    EXIT_PARSE_ERROR
                }
                _ => EXIT_ERROR,
            }
        }
    }
}

fn run_import_inner(options: ImportOptions) -> Result<ImportStatus, ImportError> {
    let config = load_config(options.config)?;
    let bundle = ImportBundle::load(options.bundle)?;
    let mut store = load_store(options.seed)?;

    let mut params = config.params().clone();
    if options.validate_only {
        params.bundle_mode = BundleMode::Validate;
    }

    let mut pipeline = ImportPipeline::with_defaults(params, config.rules.clone())?;
    let mut dispatcher = LoggingDispatcher;
    let report = pipeline.run(&bundle, &mut store, &mut dispatcher);
    tracing::info!(state = %pipeline.state(), status = %report.status(), "import finished");

    match resolve_format(options.format, &config) {
        OutputFormat::Human => {
            HumanFormatter::new(resolve_color(options.color, &config)).write_to_stdout(&report)?
        }
        OutputFormat::Jsonl => JsonlFormatter::new().write_to_stdout(&report),
    }

    Ok(report.status())
}
