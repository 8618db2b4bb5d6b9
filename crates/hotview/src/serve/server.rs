//! HTTP server.
//!
//! Every request except the reserved reload path goes through
//! [`resolve`] and is answered by exactly one of the responder, the
//! directory listing, a redirect, an empty 404 or the error page.

use crate::error::{CliError, Result};
use crate::serve::broadcaster::SharedBroadcaster;
use crate::serve::config::ServeConfig;
use crate::serve::inject::RELOAD_PATH;
use crate::serve::resolver::{resolve, ResolvedTarget};
use crate::serve::responder::{
    empty_response, failure_response, html_response, redirect_response, respond,
};
use crate::serve::listing;
use crate::ui;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive},
        Response, Sse,
    },
    routing::get,
    Router,
};
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_stream::Stream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// Ports tried after the requested one before asking the OS for any port.
const PORT_ATTEMPTS: u16 = 10;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// State shared by every request handler.
#[derive(Debug)]
pub struct ServerState {
    pub config: Arc<ServeConfig>,
    pub broadcaster: SharedBroadcaster,
}

/// Shared server state handle.
pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(config: Arc<ServeConfig>, broadcaster: SharedBroadcaster) -> SharedState {
        Arc::new(Self {
            config,
            broadcaster,
        })
    }
}

/// Build the axum router.
///
/// The reload endpoint only exists while live reload is enabled. CORS and
/// the access log are layered on when configured.
pub fn build_router(state: SharedState) -> Router {
    let config = Arc::clone(&state.config);

    let mut router = Router::<SharedState>::new();
    if config.reload_enabled() {
        router = router.route(RELOAD_PATH, get(handle_sse));
    }
    let mut router = router.fallback(handle_request).with_state(state);

    if config.cors {
        // CorsLayer only answers cross-origin requests; the allow headers go
        // on every response regardless.
        router = router
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("*"),
            ));
    }
    if config.log_requests {
        router = router.layer(middleware::from_fn(access_log));
    }

    router
}

/// Bind the listener and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`CliError::Server`] if no port can be bound or the server fails.
pub async fn serve<F>(state: SharedState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = Arc::clone(&state.config);
    let listener = bind_listener(&config.host, config.port).await?;
    let addr = listener.local_addr()?;

    if !config.quiet {
        if config.port != 0 && addr.port() != config.port {
            ui::warning(&format!(
                "Port {} is in use, serving on {} instead",
                config.port,
                addr.port()
            ));
        }
        let local = local_url(&config.host, addr.port());
        let network = network_url(&config.host, addr.port());
        ui::print_banner(&local, network.as_deref(), &config.base_dir, config.reload_enabled());
    }
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CliError::Server(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Bind `host:port`, moving on to the next ports while they are in use and
/// finally falling back to an OS-assigned port.
///
/// # Errors
///
/// Returns [`CliError::Server`] for bind failures other than a busy port, or
/// when even an OS-assigned port can't be bound.
pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
    for candidate in port..=port.saturating_add(PORT_ATTEMPTS) {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                if candidate != port {
                    tracing::debug!("Port {} is in use, bound {} instead", port, candidate);
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                tracing::debug!("Port {} in use", candidate);
            }
            Err(e) => {
                return Err(CliError::Server(format!(
                    "Failed to bind to {}:{}: {}",
                    host, candidate, e
                )));
            }
        }
    }

    let listener = TcpListener::bind((host, 0))
        .await
        .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", host, e)))?;
    tracing::debug!(
        "Ports {}-{} are in use, bound an OS-assigned port",
        port,
        port.saturating_add(PORT_ATTEMPTS)
    );
    Ok(listener)
}

/// URL for reaching the server from this machine.
pub fn local_url(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(ip) if ip.is_loopback() || ip.is_unspecified() => format!("http://localhost:{}", port),
        Ok(IpAddr::V6(ip)) => format!("http://[{}]:{}", ip, port),
        _ => format!("http://{}:{}", host, port),
    }
}

/// URL for reaching the server from other machines, when it is reachable.
pub fn network_url(host: &str, port: u16) -> Option<String> {
    if host == "localhost" || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback()) {
        return None;
    }
    let ip = match host.parse::<IpAddr>() {
        Ok(ip) if !ip.is_unspecified() => ip,
        _ => network_ip()?,
    };
    Some(format!("http://{}", SocketAddr::new(ip, port)))
}

/// First non-loopback IPv4 address, found by routing a UDP socket. Nothing
/// is sent.
fn network_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

/// Long-lived reload event stream for one browser tab.
async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (subscription, mut rx) = state.broadcaster.subscribe();
    tracing::debug!("Reload client {} connected", subscription.id());

    let stream = async_stream::stream! {
        // Dropped with the stream when the client disconnects.
        let _subscription = subscription;
        yield Ok::<_, Infallible>(Event::default().comment("connected"));
        while let Some(message) = rx.recv().await {
            yield Ok(Event::default().data(message));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("ping"))
}

/// Resolve and answer every non-reserved request.
async fn handle_request(
    State(state): State<SharedState>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let config = &state.config;
    let pathname = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    let target = resolve(pathname, config).await;
    tracing::debug!("{} -> {:?}", uri.path(), target);

    let result = match target {
        ResolvedTarget::File(path) | ResolvedTarget::SinglePageFallback(path) => {
            respond(&path, &headers, config).await
        }
        ResolvedTarget::Directory(dir) => listing::list(&dir, &config.cwd)
            .await
            .map(|html| html_response(&html, config)),
        ResolvedTarget::Redirect(location) => Ok(redirect_response(&location)),
        ResolvedTarget::NotFound => Ok(empty_response(StatusCode::NOT_FOUND)),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to serve {}: {}", uri.path(), e);
        failure_response(&e, config)
    })
}

/// One console line per request with status, elapsed time, method and path.
async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    ui::print_access(response.status().as_u16(), start.elapsed(), method.as_str(), &path);
    response
}
