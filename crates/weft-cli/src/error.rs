//! Error handling for the weft CLI.
//!
//! Every variant carries enough context to act on; most end with a hint.
//! Problems inside analyzed files are never errors here: they are printed
//! as warnings in the JSON output and do not change the exit status.

use std::path::PathBuf;

use thiserror::Error;
use weft_analyzer::AnalysisError;
use weft_core::LoadError;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A requested file or the package itself could not be analyzed
    #[error("{}\n\nHint: {}", analysis_message(.0), analysis_hint(.0))]
    Analysis(#[from] AnalysisError),

    /// The package root is not a directory
    #[error("Package root not found: {}\n\nHint: Pass an existing directory with --root", .0.display())]
    RootNotFound(PathBuf),

    /// Invalid command-line arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}\n\nHint: Create the file or drop --config to use weft.toml in the package root", .0.display())]
    NotFound(PathBuf),

    /// A configuration value has the wrong type or shape
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

fn analysis_message(error: &AnalysisError) -> String {
    match error {
        AnalysisError::Load { url, source } => format!("Could not load {url}: {source}"),
        AnalysisError::Package(source) => format!("Could not list package files: {source}"),
        AnalysisError::InvalidUrl(source) => format!("Invalid file argument: {source}"),
    }
}

fn analysis_hint(error: &AnalysisError) -> &'static str {
    match error {
        AnalysisError::Load {
            source: LoadError::NotFound(_),
            ..
        } => "File arguments are relative to the package root; check --root",
        AnalysisError::Load {
            source: LoadError::TooLarge { .. },
            ..
        } => "Very large files are skipped; analyze the files that import it instead",
        AnalysisError::Load { .. } => "Check that the file is readable UTF-8 text",
        AnalysisError::Package(_) => "Check that --root points at a readable package directory",
        AnalysisError::InvalidUrl(_) => "File arguments must be relative paths inside the package root",
    }
}

/// Convert a `CliError` into a miette report for display.
pub fn cli_error_to_miette(error: CliError) -> miette::Report {
    match error {
        CliError::Config(error) => miette::miette!("Configuration error: {}", error),
        other => miette::miette!("{}", other),
    }
}
