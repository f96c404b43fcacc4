//! Per-request context handed to actions.

use axum::http::{Extensions, Method};
use tokio_util::sync::CancellationToken;

use crate::routing::form::FormValues;

/// Everything an action knows about the request it is serving.
///
/// Built fresh for each request from the action's base extensions; never
/// shared between requests.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    params: FormValues,
    extensions: Extensions,
    cancel: CancellationToken,
}

impl RequestContext {
    pub(crate) fn new(
        method: Method,
        path: impl Into<String>,
        params: FormValues,
        extensions: Extensions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            params,
            extensions,
            cancel,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The bound path this request matched.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Flattened query and form parameters.
    pub fn params(&self) -> &FormValues {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// A value from the action's base context.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Token cancelled once the request finishes or the host abandons it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the request is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
