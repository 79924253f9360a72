//! Weft CLI library.
//!
//! The `weft` binary is a thin wrapper around these modules; they are public
//! so integration tests can drive the pieces directly.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod output;
pub mod ui;

pub use cli::Cli;
pub use error::{CliError, ConfigError, Result};
