//! Static file host for browser-driven benchmark runs.
//!
//! Serves a directory verbatim on a fixed port. The only routing logic is
//! default static-file resolution plus one media-type override: `.wasm`
//! files are served as `application/wasm` so browsers allow streaming
//! compilation.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use crate::config::WASM_MEDIA_TYPE;
use crate::error::ServeError;

/// Axum-based static file server.
pub struct StaticHost {
    addr: SocketAddr,
    root: PathBuf,
}

impl StaticHost {
    /// Creates a host serving `root` on `0.0.0.0:port`.
    pub fn new(root: PathBuf, port: u16) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            root,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds and serves until the process is terminated.
    pub async fn run(self) -> Result<(), ServeError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServeError::Bind {
                addr: self.addr.to_string(),
                source: e,
            })?;

        tracing::info!(addr = %self.addr, root = %self.root.display(), "static host ready");

        let router = build_router(self.root);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServeError::Serve(e.to_string()))?;

        Ok(())
    }
}

/// Builds the router: every path falls through to static file resolution.
pub fn build_router(root: PathBuf) -> Router {
    Router::new()
        .fallback(serve_file)
        .with_state(Arc::new(root))
}

async fn serve_file(State(root): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let Some(path) = resolve_path(&root, uri.path()) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, content_type_for(&path))],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Maps a request path to a file under `root`.
///
/// Rejects any path with non-normal components so requests cannot escape
/// the served directory. The empty path and directories resolve to
/// `index.html`.
fn resolve_path(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let trimmed = uri_path.trim_start_matches('/');
    let relative = Path::new(trimmed);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let mut path = root.join(relative);
    if trimmed.is_empty() || path.is_dir() {
        path = path.join("index.html");
    }
    Some(path)
}

/// Media type by file extension; `.wasm` gets its required override,
/// everything unrecognized falls back to the default binary type.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("wasm") => WASM_MEDIA_TYPE,
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
