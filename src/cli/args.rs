//! CLI argument parsing using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for tracker-import commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Automatically detect if terminal supports color
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}

/// tracker-import CLI main entry point
#[derive(Parser, Debug)]
#[command(name = "tracker-import")]
#[command(about = "Validate and import tracker bundles with program rules")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Output coloring
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Available tracker-import subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a JSON bundle and commit it to an in-memory store
    Import {
        /// Bundle file (JSON)
        bundle: PathBuf,

        /// Configuration file (defaults to ./import.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Validate only; nothing is committed
        #[arg(long)]
        validate_only: bool,

        /// Bundle (JSON) whose objects are stored before the import runs
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// List rule action types with their capability and effect class
    Actions {
        /// Output format
        #[arg(short, long, default_value = "human")]
        format: OutputFormat,
    },
}
