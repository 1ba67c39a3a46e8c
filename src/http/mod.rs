//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout)
//!     → request.rs (request id generation and lookup)
//!     → [routing normalizer decides redirect / rewrite / pass-through]
//!     → response.rs (redirect responses)
//!     → upstream.rs (forward to the renderer)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{EdgeServer, ServerError};
