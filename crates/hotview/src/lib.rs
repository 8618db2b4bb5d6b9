//! hotview - static file server with live reload.
//!
//! Serves a single HTML file or a directory tree over HTTP and reloads every
//! open browser tab when a file under the served directory changes.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line arguments
//! - [`config`] - Option loading from defaults, `hotview.json`, environment and flags
//! - [`serve`] - Resolution, negotiation, responses and the reload channel
//! - [`commands`] - The serve command tying it together
//! - [`error`] - Error types and diagnostics
//! - [`logger`] - `tracing` setup
//! - [`ui`] - Console banner and access log
//!
//! # Example
//!
//! ```rust,no_run
//! use hotview::config::ServeOptions;
//! use hotview::serve::{build_router, ChangeBroadcaster, ServeConfig, ServerState};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> hotview::Result<()> {
//! let config = ServeConfig::new(Path::new("site"), &ServeOptions::default())?;
//! let state = ServerState::new(Arc::new(config), Arc::new(ChangeBroadcaster::new()));
//! let _router = build_router(state);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod serve;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
