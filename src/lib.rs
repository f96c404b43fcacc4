//! Action router: exact-path, method-aware dispatch to async actions, with
//! results rendered through a view template and an optional layout.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod templates;

pub use config::RouterConfig;
pub use http::{HostServer, ResponseHead};
pub use lifecycle::Shutdown;
pub use routing::{Action, ActionError, Outcome, RequestContext, RouteMethod, Router};
pub use templates::TemplateRegistry;
