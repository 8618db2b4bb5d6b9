//! Response construction for resolved files.
//!
//! HTML is read whole and passed through the reload injector, so it is always
//! a full `200` without validators or range support. Everything else is
//! negotiated (see [`crate::serve::negotiate`]) and the chosen byte window is
//! streamed from disk.

use crate::serve::config::ServeConfig;
use crate::serve::error_page;
use crate::serve::inject::{inject, inject_bytes};
use crate::serve::negotiate::{negotiate, FileMetadata, Negotiation, Validator};
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Build the response for a resolved file.
///
/// # Errors
///
/// Returns the I/O error when the file can't be stat'ed, read or opened, for
/// example when it was removed after resolution.
pub async fn respond(path: &Path, headers: &HeaderMap, config: &ServeConfig) -> io::Result<Response> {
    let metadata = FileMetadata::from(&fs::metadata(path).await?);

    if is_html(path) {
        let bytes = fs::read(path).await?;
        return Ok(html_bytes_response(bytes, config));
    }

    let negotiation = negotiate(&metadata, headers);
    let validator = Validator::from_metadata(&metadata);
    tracing::debug!("{} -> {:?}", path.display(), negotiation);

    let mut response = match negotiation.window() {
        Some(window) => {
            let len = window.end - window.start;
            let mut file = fs::File::open(path).await?;
            if window.start > 0 {
                file.seek(SeekFrom::Start(window.start)).await?;
            }
            let stream = ReaderStream::new(file.take(len));
            let mut response = Response::new(Body::from_stream(stream));
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
            set_header(headers, header::CONTENT_TYPE, &content_type(path));
            response
        }
        None => {
            let mut response = Response::new(Body::empty());
            if matches!(negotiation, Negotiation::Unsatisfiable { .. }) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
            }
            response
        }
    };

    *response.status_mut() = negotiation.status();
    let out = response.headers_mut();
    out.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    out.insert(header::CACHE_CONTROL, cache_control(config));
    set_header(out, header::ETAG, &validator.etag);
    if let Some(last_modified) = &validator.last_modified {
        set_header(out, header::LAST_MODIFIED, last_modified);
    }
    if let Some(content_range) = negotiation.content_range() {
        set_header(out, header::CONTENT_RANGE, &content_range);
    }

    Ok(response)
}

/// A `200` HTML response with the reload script injected when enabled.
pub fn html_response(html: &str, config: &ServeConfig) -> Response {
    let body = inject(html, config.reload_enabled());
    html_with_headers(body.into_bytes(), config)
}

/// Like [`html_response`] but for raw file bytes. Only the script is added;
/// the file's own bytes are never re-encoded.
fn html_bytes_response(bytes: Vec<u8>, config: &ServeConfig) -> Response {
    html_with_headers(inject_bytes(bytes, config.reload_enabled()), config)
}

fn html_with_headers(bytes: Vec<u8>, config: &ServeConfig) -> Response {
    let len = bytes.len() as u64;
    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(header::CACHE_CONTROL, cache_control(config));
    response
}

/// The error page for a request that failed after resolution, as a `200`
/// HTML response carrying the reload script when enabled.
pub fn failure_response(error: &io::Error, config: &ServeConfig) -> Response {
    html_response(&error_page::render(error), config)
}

/// An empty response with the given status.
pub fn empty_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// A `302` pointing at `location`.
pub fn redirect_response(location: &str) -> Response {
    let mut response = empty_response(StatusCode::FOUND);
    set_header(response.headers_mut(), header::LOCATION, location);
    response
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Content must track the latest edit while reload is active; in preview
/// mode clients may keep a copy but must revalidate it.
fn cache_control(config: &ServeConfig) -> HeaderValue {
    if config.reload_enabled() {
        HeaderValue::from_static("no-store")
    } else {
        HeaderValue::from_static("no-cache")
    }
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Skipping invalid {} header value: {:?}", name, value),
    }
}
