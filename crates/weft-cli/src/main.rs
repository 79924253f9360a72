//! Weft CLI - print web component metadata for a package.

use clap::Parser;
use miette::Result;
use weft_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let no_color = args.no_color || !ui::should_use_color();
    logger::init_logger(args.verbose, args.quiet, no_color);
    ui::init_colors(!no_color);
    if no_color {
        // Only fails if a hook is already installed.
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }

    let result = commands::execute(args).await;

    result.map_err(error::cli_error_to_miette)
}
