//! Per-request dispatch and the view → layout render pipeline.
//!
//! # State Machine
//! ```text
//! Resolving → Executing → RenderingView → RenderingLayout → Writing
//!     │           │             │               │
//!     └───────────┴─────────────┴───────────────┴──→ Failed (500, plain text)
//! ```
//!
//! # Design Decisions
//! - Exact method first, then the `*` wildcard
//! - The first failure ends the request; nothing is retried
//! - Response head and buffer are locals of the request, never router state

use std::fmt;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    response::Response,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::http::request::request_id as read_request_id;
use crate::http::response::{error_response, ResponseHead};
use crate::observability::metrics;
use crate::routing::action::ActionError;
use crate::routing::context::RequestContext;
use crate::routing::form::form_values;
use crate::routing::outcome::OutcomeParts;
use crate::routing::router::Router;
use crate::templates::TemplateError;

/// Logical prefix of view templates.
pub const VIEW_PREFIX: &str = "views/";
/// Logical prefix of layout templates.
pub const LAYOUT_PREFIX: &str = "layout/";
/// Layout variable holding the rendered view.
pub const CONTENT_KEY: &str = "content";

/// Where a request is in the dispatch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Executing,
    RenderingView,
    RenderingLayout,
    Writing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolving => "resolving",
            Stage::Executing => "executing",
            Stage::RenderingView => "rendering_view",
            Stage::RenderingLayout => "rendering_layout",
            Stage::Writing => "writing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Neither (path, method) nor (path, `*`) is registered.
    #[error("Route not matched: {0}")]
    RouteNotMatched(String),

    /// The action itself failed.
    #[error("{0}")]
    Action(ActionError),

    #[error("View not found: {0}")]
    ViewNotFound(String),

    #[error("Layout not found: {0}")]
    LayoutNotFound(String),

    /// Parsing or rendering a template failed.
    #[error("{source}")]
    Template {
        stage: Stage,
        #[source]
        source: TemplateError,
    },
}

impl DispatchError {
    /// The stage the request failed in.
    pub fn stage(&self) -> Stage {
        match self {
            DispatchError::RouteNotMatched(_) => Stage::Resolving,
            DispatchError::Action(_) => Stage::Executing,
            DispatchError::ViewNotFound(_) => Stage::RenderingView,
            DispatchError::LayoutNotFound(_) => Stage::RenderingLayout,
            DispatchError::Template { stage, .. } => *stage,
        }
    }
}

/// Successful result of the pipeline, ready to be written.
struct Rendered {
    head: ResponseHead,
    body: Vec<u8>,
}

impl Router {
    /// Handle one request bound at `path` and produce its response.
    ///
    /// Failures never escape: they become a 500 with `Error: <message>`.
    /// If the templates were not parsed beforehand, the first rendering
    /// request parses them here, blocking the current worker.
    pub async fn dispatch(&self, path: &str, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let request_id = read_request_id(&request).unwrap_or("unknown").to_string();

        match self.run(path, request).await {
            Ok(Rendered { head, body }) => {
                tracing::trace!(stage = %Stage::Writing, path = %path, "Writing response");
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = head.status().as_u16(),
                    bytes = body.len(),
                    "Request dispatched"
                );
                metrics::record_request(method.as_str(), head.status().as_u16(), start);
                head.into_response(body)
            }
            Err(e) => {
                let stage = e.stage();
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    stage = %stage,
                    error = %e,
                    "Dispatch failed"
                );
                metrics::record_dispatch_failure(stage.as_str());
                metrics::record_request(method.as_str(), 500, start);
                error_response(&e.to_string())
            }
        }
    }

    async fn run(&self, path: &str, request: Request<Body>) -> Result<Rendered, DispatchError> {
        tracing::trace!(stage = %Stage::Resolving, path = %path, "Resolving action");
        let action = self
            .table()
            .resolve(path, request.method())
            .ok_or_else(|| DispatchError::RouteNotMatched(path.to_string()))?;

        let (parts, body) = request.into_parts();
        let params = form_values(&parts, body, self.max_body_size()).await;

        // Cancelled when this future completes or the host drops it.
        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();
        let ctx = RequestContext::new(
            parts.method,
            path,
            params,
            action.base().clone(),
            cancel,
        );

        tracing::trace!(stage = %Stage::Executing, path = %path, "Executing action");
        let outcome = action.run(ctx).await.map_err(DispatchError::Action)?;

        self.render(outcome.into_parts())
    }

    fn render(&self, outcome: OutcomeParts) -> Result<Rendered, DispatchError> {
        let OutcomeParts {
            data,
            view,
            layout,
            layout_vars,
            head,
        } = outcome;

        let mut buffer = Vec::new();

        if view.is_none() && layout.is_none() {
            return Ok(Rendered { head, body: buffer });
        }

        let first_stage = if view.is_some() {
            Stage::RenderingView
        } else {
            Stage::RenderingLayout
        };
        self.templates()
            .parse_glob()
            .map_err(|source| DispatchError::Template {
                stage: first_stage,
                source,
            })?;

        if let Some(view) = view {
            let name = format!("{}{}", VIEW_PREFIX, view.trim_matches('/'));
            tracing::trace!(stage = %Stage::RenderingView, template = %name, "Rendering view");

            let Some(template) = self.templates().lookup(&name) else {
                return Err(DispatchError::ViewNotFound(name));
            };
            template
                .execute(&data, &mut buffer)
                .map_err(|source| DispatchError::Template {
                    stage: Stage::RenderingView,
                    source,
                })?;
        }

        if let Some(layout) = layout {
            let name = format!("{}{}", LAYOUT_PREFIX, layout);
            tracing::trace!(stage = %Stage::RenderingLayout, template = %name, "Rendering layout");

            let Some(template) = self.templates().lookup(&name) else {
                return Err(DispatchError::LayoutNotFound(name));
            };

            let content = String::from_utf8_lossy(&buffer).into_owned();
            buffer.clear();

            template
                .execute_with_html(layout_vars, CONTENT_KEY, content, &mut buffer)
                .map_err(|source| DispatchError::Template {
                    stage: Stage::RenderingLayout,
                    source,
                })?;
        }

        Ok(Rendered { head, body: buffer })
    }
}
