//! Conditional request and byte-range negotiation.
//!
//! Given fresh file metadata and the request headers, decide between a full
//! response, `304 Not Modified`, `206 Partial Content` and
//! `416 Range Not Satisfiable`. The conditional check runs first: a matching
//! `If-None-Match` wins even when a `Range` header is present.

use axum::http::{header, HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

/// Metadata read from the filesystem on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

impl From<&std::fs::Metadata> for FileMetadata {
    fn from(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().ok(),
            is_dir: metadata.is_dir(),
        }
    }
}

/// Cache validator derived from size and modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    /// Weak entity tag, e.g. `W/"1a2b-18c4f3e2a10"`
    pub etag: String,
    /// HTTP date for `Last-Modified`, when the mtime is known
    pub last_modified: Option<String>,
}

impl Validator {
    pub fn from_metadata(metadata: &FileMetadata) -> Self {
        let mtime_ms = metadata
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis());

        Self {
            etag: format!("W/\"{:x}-{:x}\"", metadata.size, mtime_ms),
            last_modified: metadata.modified.map(http_date),
        }
    }

    /// Whether an `If-None-Match` value matches this validator exactly.
    pub fn matches(&self, if_none_match: Option<&str>) -> bool {
        if_none_match.is_some_and(|value| value.trim() == self.etag)
    }
}

fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// A parsed `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// Inclusive byte window within the file
    Valid { start: u64, end: u64 },
    /// Malformed or out of bounds
    Unsatisfiable,
}

impl RangeRequest {
    /// Parse `bytes=<start>-<end>` against a file of `size` bytes.
    ///
    /// A missing end means "to the end of the file"; a missing start is read
    /// as 0 (suffix ranges are not supported). Any bound at or past `size`,
    /// an end before the start, or an unparsable header is unsatisfiable.
    pub fn parse(value: &str, size: u64) -> Self {
        let Some(ranges) = value.trim().strip_prefix("bytes=") else {
            return RangeRequest::Unsatisfiable;
        };
        let Some((start, end)) = ranges.split_once('-') else {
            return RangeRequest::Unsatisfiable;
        };

        let start = match start.trim() {
            "" => 0,
            s => match s.parse::<u64>() {
                Ok(n) => n,
                Err(_) => return RangeRequest::Unsatisfiable,
            },
        };
        let end = match end.trim() {
            "" => size.saturating_sub(1),
            e => match e.parse::<u64>() {
                Ok(n) => n,
                Err(_) => return RangeRequest::Unsatisfiable,
            },
        };

        if start >= size || end >= size || start > end {
            return RangeRequest::Unsatisfiable;
        }

        RangeRequest::Valid { start, end }
    }
}

/// Negotiated response shape for a non-HTML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// 200 with the whole file
    Full { size: u64 },
    /// 206 with an inclusive byte window
    Partial { start: u64, end: u64, size: u64 },
    /// 304, no body
    NotModified,
    /// 416, no body
    Unsatisfiable { size: u64 },
}

impl Negotiation {
    pub fn status(&self) -> StatusCode {
        match self {
            Negotiation::Full { .. } => StatusCode::OK,
            Negotiation::Partial { .. } => StatusCode::PARTIAL_CONTENT,
            Negotiation::NotModified => StatusCode::NOT_MODIFIED,
            Negotiation::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }

    /// Value for the `Content-Range` header (206 and 416 only).
    pub fn content_range(&self) -> Option<String> {
        match self {
            Negotiation::Partial { start, end, size } => {
                Some(format!("bytes {}-{}/{}", start, end, size))
            }
            Negotiation::Unsatisfiable { size } => Some(format!("bytes */{}", size)),
            _ => None,
        }
    }

    /// Half-open byte window to send, if any body is sent.
    pub fn window(&self) -> Option<Range<u64>> {
        match self {
            Negotiation::Full { size } => Some(0..*size),
            Negotiation::Partial { start, end, .. } => Some(*start..end + 1),
            _ => None,
        }
    }
}

/// Decide how to answer a request for a file with `metadata`.
pub fn negotiate(metadata: &FileMetadata, headers: &HeaderMap) -> Negotiation {
    let validator = Validator::from_metadata(metadata);
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());

    if validator.matches(if_none_match) {
        return Negotiation::NotModified;
    }

    let Some(range) = headers.get(header::RANGE) else {
        return Negotiation::Full {
            size: metadata.size,
        };
    };

    let parsed = range
        .to_str()
        .map_or(RangeRequest::Unsatisfiable, |value| {
            RangeRequest::parse(value, metadata.size)
        });

    match parsed {
        RangeRequest::Valid { start, end } => Negotiation::Partial {
            start,
            end,
            size: metadata.size,
        },
        RangeRequest::Unsatisfiable => Negotiation::Unsatisfiable {
            size: metadata.size,
        },
    }
}
