//! Route registration and binding to the host server.
//!
//! # Responsibilities
//! - Register actions under (path, method) or (path, `*`)
//! - Attach one dispatch handler per registered path to the host
//! - Expose form parsing for callers outside the dispatch path
//!
//! # Design Decisions
//! - Registration needs `&mut self`; binding needs `Arc<Self>`, so the table
//!   cannot change once requests are being served
//! - Method dispatch happens inside the handler, not at the host

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Extensions, Method, Request},
};

use crate::http::server::{HostServer, ServerError};
use crate::routing::action::{Action, ActionResult};
use crate::routing::context::RequestContext;
use crate::routing::form::{form_values, FormValues};
use crate::routing::table::{RouteError, RouteMethod, RouteTable};
use crate::templates::TemplateRegistry;

const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Maps (path, method) to actions and renders their outcomes.
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    templates: Arc<TemplateRegistry>,
    max_body_size: usize,
}

impl Router {
    pub fn new(templates: Arc<TemplateRegistry>) -> Self {
        Self {
            table: RouteTable::new(),
            templates,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Cap on form body bytes read per request.
    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Register `work` under (path, method). Replaces any previous entry.
    pub fn bind_action<F, Fut>(
        &mut self,
        method: impl Into<RouteMethod>,
        path: &str,
        work: F,
        base: Extensions,
    ) where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        self.insert(method.into(), path, Action::new(work, base));
    }

    /// Like `bind_action`, with the method given as a string (`"*"` for any).
    pub fn bind_action_str<F, Fut>(
        &mut self,
        method: &str,
        path: &str,
        work: F,
        base: Extensions,
    ) -> Result<(), RouteError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let method: RouteMethod = method.parse()?;
        self.insert(method, path, Action::new(work, base));
        Ok(())
    }

    /// Register a prebuilt action.
    pub fn insert(&mut self, method: RouteMethod, path: &str, action: Action) {
        if self.table.insert(method.clone(), path, action) {
            tracing::debug!(method = %method, path = %path, "Route replaced");
        } else {
            tracing::debug!(method = %method, path = %path, "Route registered");
        }
    }

    pub fn get<F, Fut>(&mut self, path: &str, work: F, base: Extensions)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        self.bind_action(Method::GET, path, work, base);
    }

    pub fn post<F, Fut>(&mut self, path: &str, work: F, base: Extensions)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        self.bind_action(Method::POST, path, work, base);
    }

    /// Register for every method not registered explicitly on `path`.
    pub fn any<F, Fut>(&mut self, path: &str, work: F, base: Extensions)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        self.bind_action(RouteMethod::Any, path, work, base);
    }

    /// Flatten the query string and urlencoded body of `request`.
    pub async fn get_form_values(&self, request: Request<Body>) -> FormValues {
        let (parts, body) = request.into_parts();
        form_values(&parts, body, self.max_body_size).await
    }

    /// Attach a dispatch handler for every registered path.
    ///
    /// Fails if the host already serves one of the paths, which includes
    /// binding the same router twice.
    pub fn bind(self: &Arc<Self>, server: &mut HostServer) -> Result<(), ServerError> {
        for path in self.table.paths() {
            let router = Arc::clone(self);
            let bound_path: Arc<str> = Arc::from(path);

            server.handle(path, move |request: Request<Body>| {
                let router = Arc::clone(&router);
                let path = Arc::clone(&bound_path);
                async move { router.dispatch(&path, request).await }
            })?;
        }

        tracing::info!(
            paths = self.table.paths().len(),
            routes = self.table.len(),
            "Router bound"
        );
        Ok(())
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn templates(&self) -> &Arc<TemplateRegistry> {
        &self.templates
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}
