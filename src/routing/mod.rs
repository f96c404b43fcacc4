//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup):
//!     router.rs (get / post / any / bind_action)
//!     → table.rs (path → method → Action)
//!     → bind: one host handler per path
//!
//! Per request:
//!     dispatch.rs (exact method, then `*`)
//!     → form.rs (query + urlencoded body → params)
//!     → context.rs (base extensions + params + cancellation)
//!     → action.rs (run work) → outcome.rs (data + view/layout)
//!     → view, then layout, rendered through the template registry
//! ```
//!
//! # Design Decisions
//! - Exact string paths, no patterns
//! - Table is immutable once bound (shared via Arc, no locks)
//! - Render directives are typed fields, not context keys

pub mod action;
pub mod context;
pub mod dispatch;
pub mod form;
pub mod outcome;
pub mod router;
pub mod table;

pub use action::{Action, ActionError, ActionResult, Work};
pub use context::RequestContext;
pub use dispatch::{DispatchError, Stage};
pub use form::FormValues;
pub use outcome::Outcome;
pub use router::Router;
pub use table::{RouteError, RouteMethod, RouteTable};
