//! Configuration file parsing and validation

pub mod import_toml;

pub use import_toml::{ColorOption, ImportConfig, ImportSection, OutputConfig, OutputFormat};
