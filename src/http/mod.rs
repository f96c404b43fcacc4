//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one handler per exact path, middleware)
//!     → request.rs (request id)
//!     → [router dispatch]
//!     → response.rs (status, headers, buffered body or plain-text error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use response::{error_response, ResponseHead};
pub use server::{HostServer, ServerError};
