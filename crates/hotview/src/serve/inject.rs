//! Live-reload script injection for outgoing HTML.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Reserved path of the reload event stream.
pub const RELOAD_PATH: &str = "/__hotview_reload__";

/// Event-stream payload that triggers a reload.
pub const RELOAD_MESSAGE: &str = "reload";

/// Client script inserted into every HTML response while reload is active.
pub const RELOAD_SCRIPT: &str = concat!(
    "<script data-hotview>(() => {",
    "const source = new EventSource('/__hotview_reload__');",
    "source.onmessage = (event) => { if (event.data === 'reload') window.location.reload(); };",
    "})();</script>"
);

/// First `<!doctype ...>` (any case) or opening `<head>` tag. Matched on raw
/// bytes with Unicode off, so files in any ASCII-compatible encoding work.
static INJECTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i-u)<!doctype[^>]*>|<head(?:\s[^>]*)?>").expect("marker regex is valid")
});

/// Byte offset right after the first marker, or 0. Always ends on an ASCII
/// `>`, so it is a char boundary in UTF-8 input.
fn insertion_point(html: &[u8]) -> usize {
    INJECTION_MARKER.find(html).map_or(0, |m| m.end())
}

/// Insert the reload script after the first doctype or opening head tag, or
/// at the very start when neither exists. Returns `html` untouched when
/// reload is disabled.
pub fn inject(html: &str, enabled: bool) -> String {
    if !enabled {
        return html.to_string();
    }

    let at = insertion_point(html.as_bytes());

    let mut out = String::with_capacity(html.len() + RELOAD_SCRIPT.len());
    out.push_str(&html[..at]);
    out.push_str(RELOAD_SCRIPT);
    out.push_str(&html[at..]);
    out
}

/// [`inject`] for raw file contents. Bytes outside the inserted script are
/// copied unchanged, whatever their encoding.
pub fn inject_bytes(html: Vec<u8>, enabled: bool) -> Vec<u8> {
    if !enabled {
        return html;
    }

    let at = insertion_point(&html);

    let mut out = Vec::with_capacity(html.len() + RELOAD_SCRIPT.len());
    out.extend_from_slice(&html[..at]);
    out.extend_from_slice(RELOAD_SCRIPT.as_bytes());
    out.extend_from_slice(&html[at..]);
    out
}
