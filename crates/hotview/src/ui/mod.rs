//! Terminal UI utilities: status messages, the startup banner and access log
//! lines.
//!
//! All output goes to stderr; the caller decides whether quiet mode
//! suppresses it.

mod format;
mod messages;

pub use format::{access_line, format_elapsed, print_access, print_banner};
pub use messages::{info, success, warning};

/// Check if color output should be enabled for stderr, where both the UI
/// messages and the logs go.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them; otherwise the
/// terminal decides.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize color support based on environment and the `--no-color` flag.
pub fn init_colors(no_color: bool) {
    if no_color || !should_use_color() {
        owo_colors::set_override(false);
    }
}
