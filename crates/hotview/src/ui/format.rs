//! Formatting for startup banners and access log lines.

use owo_colors::{OwoColorize, Stream::Stderr};
use std::path::Path;
use std::time::Duration;

/// Format an elapsed request time in whole milliseconds.
///
/// ```
/// use std::time::Duration;
/// use hotview::ui::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_micros(1500)), "1ms");
/// assert_eq!(format_elapsed(Duration::from_millis(250)), "250ms");
/// ```
pub fn format_elapsed(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

/// Build one uncolored access log line: status, elapsed time, method and path.
pub fn access_line(status: u16, elapsed: Duration, method: &str, path: &str) -> String {
    format!("{} {} {} {}", status, format_elapsed(elapsed), method, path)
}

/// Print an access log line to stderr, colored by status class.
pub fn print_access(status: u16, elapsed: Duration, method: &str, path: &str) {
    let line = access_line(status, elapsed, method, path);
    match status {
        200..=299 => eprintln!("{}", line.if_supports_color(Stderr, |t| t.green())),
        300..=399 => eprintln!("{}", line.if_supports_color(Stderr, |t| t.cyan())),
        400..=499 => eprintln!("{}", line.if_supports_color(Stderr, |t| t.yellow())),
        _ => eprintln!("{}", line.if_supports_color(Stderr, |t| t.red())),
    }
}

/// Print the startup banner with the reachable URLs.
pub fn print_banner(local: &str, network: Option<&str>, root: &Path, reload: bool) {
    eprintln!();
    eprintln!(
        "  {} {}",
        "Local:  ".if_supports_color(Stderr, |t| t.bold()),
        local.if_supports_color(Stderr, |t| t.cyan())
    );
    if let Some(network) = network {
        eprintln!(
            "  {} {}",
            "Network:".if_supports_color(Stderr, |t| t.bold()),
            network.if_supports_color(Stderr, |t| t.cyan())
        );
    }
    eprintln!(
        "  {} {}",
        "Serving:".if_supports_color(Stderr, |t| t.bold()),
        root.display()
    );
    let reload_state = if reload { "enabled" } else { "disabled (preview)" };
    eprintln!(
        "  {} {}",
        "Reload: ".if_supports_color(Stderr, |t| t.bold()),
        reload_state
    );
    eprintln!();
}
