//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ConfigError};
use ::miette::{miette, Report};

/// Convert a [`CliError`] into a miette report for the terminal.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => config_error_to_miette(e),
        CliError::FileNotFound(path) => miette!(
            code = "hotview::entry_not_found",
            help = "Pass an existing file or directory, or omit the path to serve the current directory",
            "Entry point not found: {}",
            path.display()
        ),
        CliError::Server(msg) => miette!(
            code = "hotview::server",
            help = "Try a different --port or --host",
            "{}",
            msg
        ),
        CliError::Watch(e) => miette!(
            code = "hotview::watch",
            help = "Live reload needs a file watcher; use --preview to serve without it",
            "File watcher error: {}",
            e
        ),
        other => miette!("{}", other),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::InvalidValue { field, value, hint } => miette!(
            code = "hotview::config",
            help = hint,
            "Invalid value for '{}': {}",
            field,
            value
        ),
        other => miette!("Configuration error: {}", other),
    }
}
