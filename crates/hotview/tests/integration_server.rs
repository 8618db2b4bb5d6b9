//! Integration tests for the HTTP surface.
//!
//! Requests are driven through the axum router with `oneshot`, so no port is
//! bound.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use hotview::config::ServeOptions;
use hotview::serve::inject::{RELOAD_PATH, RELOAD_SCRIPT};
use hotview::serve::{
    build_router, ChangeBroadcaster, ReloadDebouncer, ServeConfig, ServerState, SingleSetting,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const INDEX: &str = "<!DOCTYPE html><html><head><title>home</title></head><body>home</body></html>";
const PAGE: &str = "<html><head></head><body>page</body></html>";

fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.html"), INDEX).unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("sub/page.html"), PAGE).unwrap();
    fs::write(temp.path().join("data.bin"), b"abcdefghijklmnopqrstuvwxyz").unwrap();
    fs::write(temp.path().join("about.html"), "<p>about</p>").unwrap();
    temp
}

fn router(root: &Path, options: ServeOptions) -> Router {
    let config = ServeConfig::new(root, &options).unwrap();
    build_router(ServerState::new(
        Arc::new(config),
        Arc::new(ChangeBroadcaster::new()),
    ))
}

async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_root_serves_index_with_reload_script() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    let body = body_text(response).await;
    assert!(body.starts_with(&format!("<!DOCTYPE html>{}", RELOAD_SCRIPT)));
    assert_eq!(body.matches(RELOAD_SCRIPT).count(), 1);
}

#[tokio::test]
async fn test_directory_without_slash_redirects() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/sub").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/sub/");

    let response = get(&app, "/sub?tab=1").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/sub/?tab=1");
}

#[tokio::test]
async fn test_directory_without_index_is_listed() {
    // A trailing slash prefers the directory's index.html, then a listing;
    // other files in the directory are never picked as its index.
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/sub/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"<a href="page.html">page.html</a>"#));
    assert_eq!(body.matches(RELOAD_SCRIPT).count(), 1);
}

#[tokio::test]
async fn test_nested_file_and_extension_completion() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/sub/page.html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("page"));

    let response = get(&app, "/about?x=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<p>about</p>"));
}

#[tokio::test]
async fn test_missing_path_is_empty_404() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/missing").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "");
}

#[tokio::test]
async fn test_single_page_fallback() {
    let temp = site();
    let options = ServeOptions {
        single: SingleSetting::Flag(true),
        ..ServeOptions::default()
    };
    let app = router(temp.path(), options);

    let response = get(&app, "/missing").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("home"));
}

#[tokio::test]
async fn test_single_page_fallback_to_missing_file_is_404() {
    let temp = site();
    let options = ServeOptions {
        single: SingleSetting::File("app.html".to_string()),
        ..ServeOptions::default()
    };
    let app = router(temp.path(), options);

    let response = get(&app, "/missing").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_escape_attempt_is_404() {
    let temp = site();
    let root = temp.path().join("sub");
    fs::write(temp.path().join("secret.txt"), "secret").unwrap();
    let app = router(&root, ServeOptions::default());

    let response = get(&app, "/../secret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/%2e%2e/secret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_single_file_entry_serves_root() {
    let temp = site();
    let app = router(&temp.path().join("sub/page.html"), ServeOptions::default());

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("page"));
}

#[tokio::test]
async fn test_range_request() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let request = Request::get("/data.bin")
        .header(header::RANGE, "bytes=2-5")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/26");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
    assert_eq!(body_text(response).await, "cdef");

    let request = Request::get("/data.bin")
        .header(header::RANGE, "bytes=20-")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 20-25/26");
    assert_eq!(body_text(response).await, "uvwxyz");
}

#[tokio::test]
async fn test_unsatisfiable_range() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    for range in ["bytes=26-30", "bytes=0-26", "bytes=5-2"] {
        let request = Request::get("/data.bin")
            .header(header::RANGE, range)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE, "{}", range);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */26");
        assert_eq!(body_text(response).await, "");
    }
}

#[tokio::test]
async fn test_conditional_request_is_repeatable() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/data.bin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response.headers()[header::ETAG].clone();
    assert!(etag.to_str().unwrap().starts_with("W/\""));

    for _ in 0..2 {
        let request = Request::get("/data.bin")
            .header(header::IF_NONE_MATCH, etag.clone())
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], etag);
        assert_eq!(body_text(response).await, "");
    }
}

#[tokio::test]
async fn test_preview_html_is_byte_identical() {
    let temp = site();
    let options = ServeOptions {
        preview: true,
        ..ServeOptions::default()
    };
    let app = router(temp.path(), options);

    let response = get(&app, "/").await;
    assert_eq!(body_text(response).await, INDEX);

    // No reload endpoint in preview mode.
    let response = get(&app, RELOAD_PATH).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_headers() {
    let temp = site();
    let options = ServeOptions {
        cors: true,
        ..ServeOptions::default()
    };
    let app = router(temp.path(), options);

    let request = Request::get("/data.bin")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");

    // Same-origin requests and error responses carry them too.
    for uri in ["/data.bin", "/missing"] {
        let response = get(&app, uri).await;
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*", "{}", uri);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*", "{}", uri);
    }

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/data.bin")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "range")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
}

#[tokio::test]
async fn test_no_cors_headers_by_default() {
    let temp = site();
    let app = router(temp.path(), ServeOptions::default());

    let request = Request::get("/data.bin")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
}

#[tokio::test]
async fn test_non_utf8_html_is_served_byte_for_byte() {
    let temp = site();
    fs::write(temp.path().join("latin1.html"), b"<!DOCTYPE html><p>caf\xe9</p>").unwrap();
    let app = router(temp.path(), ServeOptions::default());

    let response = get(&app, "/latin1.html").await;
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let mut expected = b"<!DOCTYPE html>".to_vec();
    expected.extend_from_slice(RELOAD_SCRIPT.as_bytes());
    expected.extend_from_slice(b"<p>caf\xe9</p>");
    assert_eq!(body.to_vec(), expected);
}

#[tokio::test]
async fn test_reload_endpoint_is_event_stream() {
    let temp = site();
    let config = ServeConfig::new(temp.path(), &ServeOptions::default()).unwrap();
    let broadcaster = Arc::new(ChangeBroadcaster::new());
    let app = build_router(ServerState::new(Arc::new(config), Arc::clone(&broadcaster)));

    let response = get(&app, RELOAD_PATH).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(broadcaster.client_count(), 1);

    drop(response);
    assert_eq!(broadcaster.client_count(), 0);
}

#[tokio::test]
async fn test_burst_of_changes_reaches_every_client_once() {
    let temp = site();
    let config = ServeConfig::new(temp.path(), &ServeOptions::default()).unwrap();
    let broadcaster = Arc::new(ChangeBroadcaster::new());
    let app = build_router(ServerState::new(Arc::new(config), Arc::clone(&broadcaster)));

    let first = get(&app, RELOAD_PATH).await;
    let second = get(&app, RELOAD_PATH).await;
    assert_eq!(broadcaster.client_count(), 2);

    let debouncer = ReloadDebouncer::spawn(Arc::clone(&broadcaster), Duration::from_millis(50));
    for _ in 0..5 {
        debouncer.on_change();
    }
    drop(debouncer);

    for response in [first, second] {
        // Heartbeat comment, one reload, then the stream ends once the
        // response is cut off by the timeout.
        let text = read_for(response, Duration::from_millis(300)).await;
        assert!(text.starts_with(":"));
        assert_eq!(text.matches("data: reload\n\n").count(), 1);
    }
}

/// Collect whatever the streaming body yields within `window`.
async fn read_for(response: Response, window: Duration) -> String {
    use tokio_stream::StreamExt;

    let mut stream = response.into_body().into_data_stream();
    let mut text = String::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Some(Ok(chunk))) = tokio::time::timeout_at(deadline, stream.next()).await {
        text.push_str(&String::from_utf8_lossy(&chunk));
    }
    text
}
