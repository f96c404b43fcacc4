//! Host HTTP server.
//!
//! # Responsibilities
//! - Accept exactly one handler per exact path
//! - Build the Axum router with the shared middleware stack
//! - Serve on a listener until shutdown is signalled
//!
//! # Design Decisions
//! - Duplicate paths are rejected with an error instead of a panic
//! - Paths are exact strings; anything Axum would read as a parameter
//!   (`{id}`, `{*rest}`) is refused, and `:`/`*` segments match literally
//! - Unbound paths fall through to Axum's 404

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RouterConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

type BoxedHandler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Errors raised by the host server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("a handler is already registered for {0}")]
    DuplicateHandler(String),

    #[error("invalid path {0:?}: must start with '/' and contain no '{{' or '}}'")]
    InvalidPath(String),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exact-path handler mux in front of Axum.
pub struct HostServer {
    handlers: BTreeMap<String, BoxedHandler>,
    request_timeout: Duration,
}

impl Default for HostServer {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HostServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            handlers: BTreeMap::new(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }
    }

    /// Attach `handler` at `path`.
    pub fn handle<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), ServerError>
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        if !path.starts_with('/') || path.contains(['{', '}']) {
            return Err(ServerError::InvalidPath(path.to_string()));
        }
        if self.handlers.contains_key(path) {
            return Err(ServerError::DuplicateHandler(path.to_string()));
        }

        let boxed: BoxedHandler = Arc::new(
            move |request: Request<Body>| -> BoxFuture<'static, Response> { Box::pin(handler(request)) },
        );
        self.handlers.insert(path.to_string(), boxed);
        tracing::debug!(path = %path, "Handler attached");
        Ok(())
    }

    pub fn has_handler(&self, path: &str) -> bool {
        self.handlers.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Build the Axum router with all middleware layers.
    pub fn into_router(self) -> Router {
        // Legacy `:param`/`*wildcard` syntax would panic here; treat it as text.
        let mut app = Router::new().without_v07_checks();
        for (path, handler) in self.handlers {
            app = app.route(
                &path,
                any(move |request: Request<Body>| (*handler)(request)),
            );
        }

        app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            self.request_timeout,
        ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            paths = self.handlers.len(),
            "HTTP server starting"
        );

        let app = self.into_router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn ok_handler() -> impl Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync + 'static {
        |_request: Request<Body>| -> BoxFuture<'static, Response> {
            Box::pin(async { Response::new(Body::from("ok")) })
        }
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut server = HostServer::new();
        server.handle("/a", ok_handler()).unwrap();

        let err = server.handle("/a", ok_handler()).unwrap_err();
        assert!(matches!(err, ServerError::DuplicateHandler(ref p) if p == "/a"));
        assert_eq!(server.paths().collect::<Vec<_>>(), vec!["/a"]);
    }

    #[test]
    fn test_pattern_like_paths_rejected() {
        let mut server = HostServer::new();
        assert!(matches!(
            server.handle("/users/{id}", ok_handler()),
            Err(ServerError::InvalidPath(_))
        ));
        assert!(matches!(
            server.handle("relative", ok_handler()),
            Err(ServerError::InvalidPath(_))
        ));
        assert!(!server.has_handler("relative"));
    }

    #[tokio::test]
    async fn test_exact_paths_only() {
        let mut server = HostServer::new();
        server.handle("/a", ok_handler()).unwrap();
        let app = server.into_router();

        let response = app
            .clone()
            .oneshot(Request::get("/a").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = app
            .oneshot(Request::get("/a/b").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_colon_and_star_segments_are_literal() {
        let mut server = HostServer::new();
        server.handle("/users/:id", ok_handler()).unwrap();
        server.handle("/files/*", ok_handler()).unwrap();
        let app = server.into_router();

        for path in ["/users/:id", "/files/*"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }

        let response = app
            .oneshot(Request::get("/users/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
