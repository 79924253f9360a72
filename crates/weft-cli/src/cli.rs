//! Command-line interface definition.
//!
//! `weft [OPTIONS] [FILES]...` analyzes the given files, or the whole package
//! under `--root` when no files are given, and prints the web component
//! metadata it found as JSON.

use std::path::PathBuf;

use clap::Parser;

/// Weft - web component metadata for a package
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "weft",
    version,
    about = "Print web component metadata for a package",
    long_about = "Weft analyzes HTML, JavaScript and CSS sources, follows their imports\n\
                  and prints the custom elements, mixins, behaviors and namespaces it\n\
                  finds as JSON. Without FILES the whole package under --root is analyzed."
)]
pub struct Cli {
    /// Files to analyze, relative to the package root
    ///
    /// Every file's imports are followed. Without files, every HTML,
    /// JavaScript, CSS and JSON file of the package is an entry point.
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Package root directory
    ///
    /// Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Configuration file
    ///
    /// Defaults to weft.toml in the package root, if present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Include features from dependencies (node_modules, bower_components)
    #[arg(long)]
    pub external_packages: bool,

    /// Follow lazy imports (`import()` and `<link rel="lazy-import">`)
    #[arg(long)]
    pub lazy_imports: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    ///
    /// The JSON document is still written to stdout.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}
