//! Request path to serving target resolution.
//!
//! Resolution only looks at the request path and the filesystem (existence
//! and file type); it never reads request bodies or headers. The first
//! matching rule wins:
//!
//! 1. Strip the query string and fragment, then percent-decode (falling back
//!    to the raw path if decoding yields invalid UTF-8).
//! 2. `/` with a single-file entry point serves that file.
//! 3. A path ending in `/` serves `<dir>/index.html`, or lists `<dir>`.
//! 4. An existing file is served; an existing directory redirects to the
//!    same path with a trailing slash, keeping the query string.
//! 5. `<path>.html` is served for extensionless URLs.
//! 6. The single-page fallback file, if configured and present.
//! 7. Not found.
//!
//! Paths are normalized lexically before touching the filesystem: empty and
//! `.` segments are dropped, `..` pops a segment, and a `..` that would climb
//! above the base directory resolves to [`ResolvedTarget::NotFound`].

use crate::serve::config::ServeConfig;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of resolving one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// Serve this file
    File(PathBuf),
    /// Render a listing of this directory
    Directory(PathBuf),
    /// Redirect to this URL path
    Redirect(String),
    /// Serve the single-page fallback file
    SinglePageFallback(PathBuf),
    /// Nothing matches
    NotFound,
}

/// Resolve a request path against the configured base directory.
pub async fn resolve(pathname: &str, config: &ServeConfig) -> ResolvedTarget {
    let (raw, query) = split_query(pathname);
    let decoded = decode_path(raw);

    let Some(segments) = normalize_segments(&decoded) else {
        tracing::debug!("Rejected path escaping the base directory: {}", raw);
        return ResolvedTarget::NotFound;
    };

    if decoded == "/" {
        if let Some(entry_file) = &config.entry_file {
            return ResolvedTarget::File(entry_file.clone());
        }
    }

    let target = join_segments(&config.base_dir, &segments);

    if decoded.ends_with('/') {
        let index = target.join("index.html");
        if is_file(&index).await {
            return ResolvedTarget::File(index);
        }
        if is_dir(&target).await {
            return ResolvedTarget::Directory(target);
        }
        return fallback(config).await;
    }

    if let Ok(metadata) = fs::metadata(&target).await {
        if metadata.is_file() {
            return ResolvedTarget::File(target);
        }
        if metadata.is_dir() {
            return ResolvedTarget::Redirect(directory_location(raw, query));
        }
    }

    if let Some(last) = segments.last() {
        let with_extension = target.with_file_name(format!("{}.html", last));
        if is_file(&with_extension).await {
            return ResolvedTarget::File(with_extension);
        }
    }

    fallback(config).await
}

async fn fallback(config: &ServeConfig) -> ResolvedTarget {
    match config.fallback_path() {
        Some(path) if is_file(&path).await => ResolvedTarget::SinglePageFallback(path),
        _ => ResolvedTarget::NotFound,
    }
}

/// Split off the query string. The fragment, if a client sent one, is dropped.
fn split_query(pathname: &str) -> (&str, Option<&str>) {
    let without_fragment = pathname.split_once('#').map_or(pathname, |(rest, _)| rest);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
        None => (without_fragment, None),
    }
}

/// Percent-decode a URL path, keeping the raw string when the decoded bytes
/// aren't valid UTF-8.
fn decode_path(raw: &str) -> Cow<'_, str> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}

/// Split a decoded path into normalized segments.
///
/// Returns `None` when `..` would climb above the root.
fn normalize_segments(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    Some(segments)
}

fn join_segments(base: &Path, segments: &[&str]) -> PathBuf {
    let mut path = base.to_path_buf();
    path.extend(segments);
    path
}

/// Location for a directory requested without its trailing slash.
///
/// Repeated slashes are collapsed so the result is never protocol-relative.
fn directory_location(raw: &str, query: Option<&str>) -> String {
    let mut location = String::with_capacity(raw.len() + 2);
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        location.push('/');
        location.push_str(segment);
    }
    location.push('/');
    if let Some(query) = query {
        location.push('?');
        location.push_str(query);
    }
    location
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}
