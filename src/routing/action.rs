//! Actions: the unit of work stored in the route table.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Extensions;
use futures_util::future::BoxFuture;

use crate::routing::context::RequestContext;
use crate::routing::outcome::Outcome;

/// Failure returned by an action. Any error type converts into it with `?`.
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running an action.
pub type ActionResult = Result<Outcome, ActionError>;

/// Something that can handle a request.
///
/// Implemented for every `Fn(RequestContext) -> impl Future<Output = ActionResult>`
/// that can be shared across threads, so plain async closures and `async fn`s
/// register directly.
pub trait Work: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, ActionResult>;
}

impl<F, Fut> Work for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, ActionResult> {
        Box::pin(self(ctx))
    }
}

/// A registered handler paired with the context every request starts from.
#[derive(Clone)]
pub struct Action {
    work: Arc<dyn Work>,
    base: Extensions,
}

impl Action {
    pub fn new<F, Fut>(work: F, base: Extensions) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self::from_work(work, base)
    }

    /// Wrap a hand-written `Work` implementation.
    pub fn from_work(work: impl Work, base: Extensions) -> Self {
        Self {
            work: Arc::new(work),
            base,
        }
    }

    pub fn base(&self) -> &Extensions {
        &self.base
    }

    pub(crate) fn run(&self, ctx: RequestContext) -> BoxFuture<'static, ActionResult> {
        self.work.call(ctx)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("base_entries", &self.base.len())
            .finish_non_exhaustive()
    }
}
