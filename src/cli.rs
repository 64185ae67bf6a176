//! CLI argument parsing and command dispatch

pub mod actions;
pub mod args;
pub mod common;
pub mod import;

// Re-export types for convenient access
pub use args::{Cli, ColorChoice, Command, OutputFormat};
