//! Shared fixtures for integration tests.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use action_router::http::HostServer;
use action_router::{Router, TemplateRegistry};
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

/// Template files used by most tests.
pub const SITE: &[(&str, &str)] = &[
    ("views/greet.html", "Hello {{ name }}"),
    ("views/list.html", "{% for item in items %}[{{ item }}]{% endfor %}"),
    (
        "layout/main.html",
        "<title>{{ title | default(value=\"none\") }}</title><main>{{ content }}</main>",
    ),
    ("layout/strict.html", "{{ missing_var }}"),
];

/// A temporary template tree plus an unparsed registry over it.
pub struct Site {
    pub dir: TempDir,
    pub templates: Arc<TemplateRegistry>,
}

impl Site {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (relative, body) in files {
            write(dir.path(), relative, body);
        }

        let mut registry = TemplateRegistry::new(dir.path());
        registry.add_path("views/*.html");
        registry.add_path("layout/*.html");

        Self {
            dir,
            templates: Arc::new(registry),
        }
    }

    pub fn router(&self) -> Router {
        Router::new(Arc::clone(&self.templates))
    }
}

pub fn write(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Bind `router` to a fresh host and return the Axum app.
pub fn app(router: Router) -> axum::Router {
    let mut server = HostServer::new();
    Arc::new(router).bind(&mut server).unwrap();
    server.into_router()
}

/// Send one request through `app` and collect the response.
pub async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}
