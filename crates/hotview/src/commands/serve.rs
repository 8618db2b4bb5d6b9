//! The serve command.
//!
//! Orchestrates the server lifecycle:
//! - Load options and build the immutable [`ServeConfig`]
//! - Start the file watcher and reload debouncer unless in preview mode
//! - Serve HTTP until Ctrl+C

use crate::cli::Cli;
use crate::config::ServeOptions;
use crate::error::{Result, ResultExt};
use crate::serve::server;
use crate::serve::{
    ChangeBroadcaster, FileWatcher, ReloadDebouncer, ServeConfig, ServerState, SharedBroadcaster,
    DEBOUNCE_WINDOW,
};
use crate::ui;
use std::path::PathBuf;
use std::sync::Arc;

/// Execute the serve command.
///
/// # Errors
///
/// Returns errors for invalid configuration, a missing entry point, watcher
/// setup failures and bind failures.
pub async fn execute(args: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let options = ServeOptions::load(&args, &cwd)?;

    let entry = args.entry.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = Arc::new(ServeConfig::new(&entry, &options)?);
    tracing::debug!("Serve config: {:?}", config);

    let broadcaster: SharedBroadcaster = Arc::new(ChangeBroadcaster::new());

    // Watching stops when this is dropped at the end of the command.
    let _watcher = if config.reload_enabled() {
        Some(start_watching(&config, &broadcaster)?)
    } else {
        tracing::info!("Preview mode, live reload disabled");
        None
    };

    let quiet = config.quiet;
    let state = ServerState::new(config, broadcaster);
    server::serve(state, shutdown_signal(quiet)).await?;

    if !quiet {
        ui::success("Server stopped");
    }
    Ok(())
}

/// Watch the base directory and feed every change to the debouncer.
fn start_watching(config: &ServeConfig, broadcaster: &SharedBroadcaster) -> Result<FileWatcher> {
    let (watcher, mut changes) = FileWatcher::new(config.base_dir.clone())?;
    let debouncer = ReloadDebouncer::spawn(Arc::clone(broadcaster), DEBOUNCE_WINDOW);

    tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            tracing::debug!("Changed: {}", change.path().display());
            debouncer.on_change();
        }
    });

    tracing::info!("Watching {}", watcher.root().display());
    Ok(watcher)
}

async fn shutdown_signal(quiet: bool) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    if !quiet {
        ui::info("Shutting down...");
    }
}
