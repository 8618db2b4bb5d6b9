//! Command-line interface definition for hotview.
//!
//! A single command: serve a file or directory with live reload.
//!
//! ```text
//! hotview                      # serve the current directory
//! hotview site/                # serve a directory
//! hotview page.html            # serve a single file at /
//! hotview dist --single        # SPA fallback to index.html
//! hotview dist --single=app.html
//! ```

mod validation;

use crate::serve::config::SinglePage;
use clap::Parser;
use std::path::PathBuf;

pub use validation::parse_single;

/// hotview - static file server with live reload
#[derive(Parser, Debug)]
#[command(
    name = "hotview",
    version,
    about = "Static file server with live reload",
    long_about = "Serves a single HTML file or a directory tree for local development.\n\
                  Connected browser tabs reload automatically whenever a file under the\n\
                  served directory changes."
)]
pub struct Cli {
    /// File or directory to serve
    ///
    /// A directory is served as the site root. A single file is served at `/`
    /// with its parent directory as the site root.
    #[arg(value_name = "PATH")]
    pub entry: Option<PathBuf>,

    /// Add permissive CORS headers to every response
    #[arg(long)]
    pub cors: bool,

    /// Suppress startup and access logging
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print one line per request (status, time, method, path)
    #[arg(short, long)]
    pub logs: bool,

    /// Host to bind to
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on; the next free port is used if it is taken
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Serve a fallback page for unresolved paths (single-page apps)
    ///
    /// `--single` falls back to index.html, `--single=app.html` to a
    /// specific file, `--single=false` turns the fallback off.
    #[arg(
        short,
        long,
        value_name = "FILE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = parse_single
    )]
    pub single: Option<SinglePage>,

    /// Preview mode: disable live reload
    #[arg(long)]
    pub preview: bool,

    /// Options file (defaults to ./hotview.json when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
