//! tracker-import CLI entry point

use clap::Parser;
use std::process;
use tracker_import::cli::import::ImportOptions;
use tracker_import::cli::{Command, args::Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Import {
            bundle,
            config,
            format,
            validate_only,
            seed,
        } => tracker_import::cli::import::run_import(ImportOptions {
            bundle: &bundle,
            config: config.as_deref(),
            format,
            validate_only,
            seed: seed.as_deref(),
            color: cli.color,
        }),
        Command::Actions { format } => tracker_import::cli::actions::run_actions(format),
    };

    process::exit(exit_code);
}
