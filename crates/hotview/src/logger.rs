//! Logging infrastructure for hotview.
//!
//! Structured logging via the `tracing` ecosystem. Request resolution and
//! watcher activity log at debug level; lifecycle events at info.
//!
//! # Example
//!
//! ```rust,no_run
//! use hotview::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Server starting");
//! debug!("Resolved {} to {}", "/", "index.html");
//! ```

use crate::ui::should_use_color;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "hotview=debug,tower_http=debug";

/// Filter used with `--quiet`.
pub const QUIET_FILTER: &str = "hotview=error";

/// Filter used when neither flag nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "hotview=info";

/// Initialize the tracing subscriber.
///
/// Should be called once, before anything logs. The level is chosen in this
/// order:
/// 1. `verbose`: debug for hotview
/// 2. `quiet`: errors only
/// 3. `RUST_LOG` environment variable
/// 4. info for hotview
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(build_filter(verbose, quiet), no_color);
}

/// Initialize logger with a custom environment filter.
///
/// Logs share stderr with the UI messages and follow the same color choice.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_color())
        .compact();

    // try_init: tests and embedders may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_parse() {
        let _ = build_filter(true, false);
        let _ = build_filter(false, true);
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }
}
