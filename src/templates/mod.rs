//! Template subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     root + glob patterns (config)
//!     → registry.rs (expand globs, name files, parse into one Tera namespace)
//!     → namespace swapped in atomically, immutable afterwards
//!
//! Per request:
//!     logical name ("views/home", "layout/main")
//!     → lookup → execute against JSON data into a byte sink
//! ```
//!
//! # Design Decisions
//! - Parsed once, lazily; no hot reload
//! - Names are derived from the file path relative to root, extension dropped
//! - Readers never lock; the namespace is published through `ArcSwap`

pub mod error;
pub mod registry;

pub use error::TemplateError;
pub use registry::{Template, TemplateRegistry, VALUE_KEY};
