//! Common helper functions shared across CLI commands

use crate::cli::args::{ColorChoice, OutputFormat};
use crate::config::{self, ImportConfig};
use crate::error::ConfigError;
use crate::import::{ImportBundle, InMemoryStore};
use std::path::Path;

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_IMPORT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;
pub const EXIT_PARSE_ERROR: i32 = 3;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG: &str = "import.toml";

/// Load the import configuration
///
/// An explicit path must exist. Without one, `import.toml` in the working
/// directory is used when present and the defaults otherwise.
///
/// # Errors
///
/// Returns `ConfigError::Io` if an explicit config file cannot be read.
/// Returns `ConfigError::Parse` if the file is invalid TOML.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ImportConfig, ConfigError> {
    match path {
        Some(path) => ImportConfig::load(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG);
            if default_path.exists() {
                ImportConfig::load(default_path)
            } else {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG);
                Ok(ImportConfig::default())
            }
        }
    }
}

/// In-memory store seeded from an optional bundle file
pub(crate) fn load_store(seed: Option<&Path>) -> Result<InMemoryStore, ConfigError> {
    match seed {
        Some(path) => {
            let bundle = ImportBundle::load(path)?;
            tracing::info!(objects = bundle.len(), "seeding store");
            Ok(InMemoryStore::from_bundle(&bundle))
        }
        None => Ok(InMemoryStore::new()),
    }
}

/// Resolves the output format: command line first, then configuration
pub(crate) fn resolve_format(flag: Option<OutputFormat>, config: &ImportConfig) -> OutputFormat {
    flag.unwrap_or(match config.output.format {
        config::OutputFormat::Human => OutputFormat::Human,
        config::OutputFormat::Jsonl => OutputFormat::Jsonl,
    })
}

/// Resolves the terminal color choice; an explicit flag beats configuration
pub(crate) fn resolve_color(flag: ColorChoice, config: &ImportConfig) -> termcolor::ColorChoice {
    let choice = match (flag, config.output.color) {
        (ColorChoice::Auto, config::ColorOption::Always) => ColorChoice::Always,
        (ColorChoice::Auto, config::ColorOption::Never) => ColorChoice::Never,
        (flag, _) => flag,
    };
    match choice {
        ColorChoice::Auto => termcolor::ColorChoice::Auto,
        ColorChoice::Always => termcolor::ColorChoice::Always,
        ColorChoice::Never => termcolor::ColorChoice::Never,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[import]\nversion = \"1\"\nimport_mode = \"UPDATE\"\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(
            config.params().import_mode,
            crate::import::ImportMode::Update
        );
    }

    #[test]
    fn test_missing_explicit_config_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(dir.path().join("missing.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_store_without_seed_is_empty() {
        assert!(load_store(None).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_format_prefers_flag() {
        let mut config = ImportConfig::default();
        config.output.format = config::OutputFormat::Jsonl;
        assert_eq!(resolve_format(None, &config), OutputFormat::Jsonl);
        assert_eq!(
            resolve_format(Some(OutputFormat::Human), &config),
            OutputFormat::Human
        );
    }

    #[test]
    fn test_resolve_color() {
        let mut config = ImportConfig::default();
        config.output.color = config::ColorOption::Never;
        assert_eq!(
            resolve_color(ColorChoice::Auto, &config),
            termcolor::ColorChoice::Never
        );
        assert_eq!(
            resolve_color(ColorChoice::Always, &config),
            termcolor::ColorChoice::Always
        );
    }
}
