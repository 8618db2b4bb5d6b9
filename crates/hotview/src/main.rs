//! hotview - static file server with live reload.
//!
//! Parses arguments, initializes logging and colors, and runs the server.

use clap::Parser;
use hotview::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    commands::serve_execute(args)
        .await
        .map_err(error::cli_error_to_miette)
}
