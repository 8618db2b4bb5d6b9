//! Error page rendered when serving a resolved target fails.
//!
//! Resolution misses and bad ranges are not errors (they become 404 and 416).
//! This page covers unexpected I/O failures such as a file deleted between
//! resolution and read, or a permission error. It is always sent with status
//! 200: the page itself is the failure signal.

use std::error::Error;
use std::fmt::Write as _;

/// Render an HTML page showing `error`'s message and its source chain.
pub fn render(error: &(dyn Error + 'static)) -> String {
    let message = html_escape(&error.to_string());
    let stack = html_escape(&stack_text(error));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Error - hotview</title>
    <style>
        body {{ font-family: 'Menlo', 'Monaco', 'Courier New', monospace; background: #1a1a1a; color: #e8e8e8; padding: 20px; }}
        h1 {{ color: #ff6b6b; font-size: 18px; }}
        pre {{ background: #2a2a2a; padding: 20px; border-left: 4px solid #ff4444; white-space: pre-wrap; }}
    </style>
</head>
<body>
    <h1>{message}</h1>
    <pre>{stack}</pre>
</body>
</html>
"#
    )
}

/// Debug form of the error followed by each `source()` in turn.
fn stack_text(error: &(dyn Error + 'static)) -> String {
    let mut text = format!("{:?}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(text, "\ncaused by: {}", cause);
        source = cause.source();
    }
    text
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
